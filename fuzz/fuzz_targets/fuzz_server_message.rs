#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_lobby_client::protocol::ServerMessage;

fuzz_target!(|data: &[u8]| {
    let _ = serde_json::from_slice::<ServerMessage>(data);

    // Anything that parses must serialize again.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(msg) = serde_json::from_str::<ServerMessage>(s) {
            let _ = serde_json::to_string(&msg);
        }
    }
});
