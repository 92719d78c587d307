use crate::{ParseError, ParseResult};
use std::io;
use std::io::Write;

const BASE64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const BASE64_VALUES: [i8; 256] = get_base64_map();

const fn get_base64_map() -> [i8; 256] {
    let mut res = [-1i8; 256];
    // `for in` is not allowed in const fn
    let mut idx = 0;
    while idx < 64 {
        res[BASE64_CHARS[idx] as usize] = idx as i8;
        idx += 1;
    }
    res
}

const CONTINUATION_BIT: i64 = 1 << 5;
const MASK: i64 = CONTINUATION_BIT - 1;

/// Decodes one zig-zag folded base64 VLQ starting at `cursor`.
///
/// Returns the value together with the cursor position just past its last
/// digit, since a mapping segment packs several values back to back.
pub(crate) fn decode(bytes: &[u8], cursor: usize) -> ParseResult<(i64, usize)> {
    let mut cursor = cursor;
    let mut value = 0i64;
    let mut shift = 0u32;

    loop {
        let &byte = bytes.get(cursor).ok_or(ParseError::VlqTruncated)?;
        cursor += 1;

        let digit = BASE64_VALUES[byte as usize] as i64;
        if digit < 0 {
            return Err(ParseError::InvalidBase64(byte));
        }

        value += (digit & MASK)
            .checked_shl(shift)
            .ok_or(ParseError::VlqOverflow)?;
        shift += 5;

        if digit & CONTINUATION_BIT == 0 {
            break;
        }
    }

    let negative = value & 1 == 1;
    value >>= 1;
    if negative {
        value = -value;
    }
    Ok((value, cursor))
}

#[derive(Debug)]
pub(crate) struct VlqEncoder<'a, W>
where
    W: Write,
{
    writer: &'a mut W,
}

impl<'a, W> VlqEncoder<'a, W>
where
    W: Write,
{
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    /// Writes `cur - prev` as one zig-zag folded base64 VLQ.
    pub fn encode(&mut self, prev: u32, cur: u32) -> io::Result<()> {
        let delta = cur as i64 - prev as i64;

        let mut num = if delta < 0 {
            ((-delta) << 1) + 1
        } else {
            delta << 1
        } as u64;

        loop {
            let mut digit = (num & MASK as u64) as usize;
            num >>= 5;
            if num != 0 {
                digit |= CONTINUATION_BIT as usize;
            }
            self.writer.write_all(&[BASE64_CHARS[digit]])?;
            if num == 0 {
                break;
            }
        }

        Ok(())
    }
}
