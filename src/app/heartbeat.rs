//! Heartbeat message composition.
//!
//! The template comes from the device configuration with `{addr}` and
//! `{time}` placeholders; both presets use one of each, but the
//! substitution handles any count or order. Output is a bounded string —
//! overflow truncates rather than allocates, and the message is built
//! per publish and discarded afterwards.

use super::ports::HEARTBEAT_CAP;

/// Substitute `{addr}` and `{time}` into `template`.
pub fn compose(template: &str, addr: &str, time: &str) -> heapless::String<HEARTBEAT_CAP> {
    let mut out = heapless::String::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let _ = out.push_str(&rest[..open]);
        let tail = &rest[open..];
        if let Some(close) = tail.find('}') {
            let key = &tail[1..close];
            match key {
                "addr" => {
                    let _ = out.push_str(addr);
                }
                "time" => {
                    let _ = out.push_str(time);
                }
                // Unknown placeholders pass through untouched.
                _ => {
                    let _ = out.push_str(&tail[..=close]);
                }
            }
            rest = &tail[close + 1..];
        } else {
            // Unbalanced brace: emit the remainder as-is.
            let _ = out.push_str(tail);
            rest = "";
        }
    }
    let _ = out.push_str(rest);
    out
}
