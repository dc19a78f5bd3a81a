// chatgen-core/src/utils/debug.rs
#[cfg(feature = "utf8-trace")]
pub(crate) fn dump_bytes(label: &str, bytes: &[u8]) {
    use std::fmt::Write;
    let mut hex = String::with_capacity(bytes.len() * 3);
    for b in bytes {
        let _ = write!(&mut hex, "{:02X} ", b);
    }
    let mut cps = String::new();
    for ch in String::from_utf8_lossy(bytes).chars() {
        let _ = write!(&mut cps, "U+{:04X} ", ch as u32);
    }
    tracing::trace!(target: "chatgen::utf8", label, bytes = %hex.trim_end(), cps = %cps.trim_end());
}

#[cfg(not(feature = "utf8-trace"))]
#[inline(always)]
pub(crate) fn dump_bytes(_label: &str, _bytes: &[u8]) {}
