#![no_main]
use libfuzzer_sys::fuzz_target;
use sonic::command::CommandOutcome;
use sonic::fleet::{HttpReply, RefreshResponse, VehicleListResponse};

fuzz_target!(|data: &[u8]| {
    // First two bytes pick the status, the rest is the body
    if data.len() < 2 {
        return;
    }
    let status = u16::from_be_bytes([data[0], data[1]]) % 600;
    let body = String::from_utf8_lossy(&data[2..]).into_owned();
    let reply = HttpReply::new(status, body);

    let _ = CommandOutcome::classify(&reply);
    if let Ok(list) = reply.json::<VehicleListResponse>() {
        for record in &list.response {
            let _ = record.identity();
        }
    }
    if let Ok(refresh) = reply.json::<RefreshResponse>() {
        let _ = refresh.expires_at.as_ref().and_then(|e| e.to_datetime());
    }
    let _ = sonic::companion::parse_command_line(&reply.body);
});
