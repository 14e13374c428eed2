//! Little-endian cursor helpers shared by the equities and options decoder
//! branches.
//!
//! Grounded on the teacher's inline `read_u8`/`read_u16_le`/`read_u32_le`/
//! `read_f32_le` free functions (`ws/market_feed.rs`), generalized into a
//! cursor so each decoder can bail out cleanly on an overrun instead of
//! panicking on an out-of-bounds slice index.

/// A forward-only cursor over a byte slice. Every read returns `None` on
/// overrun instead of panicking, so a truncated frame degrades to a
/// `ProtocolError` rather than crashing the worker (spec §4.3, §8 property 2).
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn u8(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    pub fn u16_le(&mut self) -> Option<u16> {
        let bytes: [u8; 2] = self.take(2)?.try_into().ok()?;
        Some(u16::from_le_bytes(bytes))
    }

    pub fn u32_le(&mut self) -> Option<u32> {
        let bytes: [u8; 4] = self.take(4)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    pub fn u64_le(&mut self) -> Option<u64> {
        let bytes: [u8; 8] = self.take(8)?.try_into().ok()?;
        Some(u64::from_le_bytes(bytes))
    }

    pub fn i32_le(&mut self) -> Option<i32> {
        let bytes: [u8; 4] = self.take(4)?.try_into().ok()?;
        Some(i32::from_le_bytes(bytes))
    }

    pub fn i64_le(&mut self) -> Option<i64> {
        let bytes: [u8; 8] = self.take(8)?.try_into().ok()?;
        Some(i64::from_le_bytes(bytes))
    }

    pub fn f32_le(&mut self) -> Option<f32> {
        let bytes: [u8; 4] = self.take(4)?.try_into().ok()?;
        Some(f32::from_le_bytes(bytes))
    }

    /// Take `n` raw bytes and advance.
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(slice)
    }

    /// Take `n` bytes and interpret them as ASCII, trimming trailing
    /// whitespace and NUL padding (spec §4.3: "condition (8-byte ASCII,
    /// trimmed)").
    pub fn ascii_trimmed(&mut self, n: usize) -> Option<String> {
        let raw = self.take(n)?;
        Some(
            String::from_utf8_lossy(raw)
                .trim_end_matches(['\0', ' '])
                .to_owned(),
        )
    }
}

/// Apply the fixed-point divisor and map the wire sentinel for `NaN`
/// (spec §4.3: "Fixed-point prices divide by 10 000 ... `NaN` permitted
/// when wire value equals sentinel `INT32_MIN`").
pub fn fixed_point_price(raw: i32) -> f64 {
    if raw == crate::constants::PRICE_NAN_SENTINEL {
        f64::NAN
    } else {
        f64::from(raw) / crate::constants::PRICE_DIVISOR
    }
}

/// Same as [`fixed_point_price`] for an 8-byte fixed-point field
/// (underlying price at execution, total value).
pub fn fixed_point_price_i64(raw: i64) -> f64 {
    if raw == i64::from(crate::constants::PRICE_NAN_SENTINEL) {
        f64::NAN
    } else {
        raw as f64 / crate::constants::PRICE_DIVISOR
    }
}
