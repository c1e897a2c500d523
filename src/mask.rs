/// Masks or unmasks `buf` in place, starting at `phase` within the key.
///
/// `phase` is the position of `buf[0]` within the masked payload, so a payload split at any
/// point can be processed in pieces: the returned phase is the one to pass for the next piece.
///
/// ```rust
/// let key = [0x37, 0xfa, 0x21, 0x3d];
/// let mut payload = *b"Hello";
///
/// let (head, tail) = payload.split_at_mut(3);
/// let phase = wsframe::apply_mask(head, key, 0);
/// wsframe::apply_mask(tail, key, phase);
///
/// assert_eq!(payload, [0x7f, 0x9f, 0x4d, 0x51, 0x58]);
/// ```
#[inline]
pub fn apply_mask(buf: &mut [u8], key: [u8; 4], phase: usize) -> usize {
    let phase = phase & 3;
    let rotated = if phase == 0 {
        key
    } else {
        [
            key[phase],
            key[(phase + 1) & 3],
            key[(phase + 2) & 3],
            key[(phase + 3) & 3],
        ]
    };
    apply_mask_fast32(buf, rotated);
    (phase + buf.len()) & 3
}

#[inline]
fn apply_mask_fallback(buf: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= mask[i & 3];
    }
}

/// Operates on 4-byte words once `buf` is aligned.
#[inline]
fn apply_mask_fast32(buf: &mut [u8], mask: [u8; 4]) {
    let mask_u32 = u32::from_ne_bytes(mask);

    // SAFETY: every bit pattern is a valid u32, and the prefix/suffix are handled bytewise.
    let (prefix, words, suffix) = unsafe { buf.align_to_mut::<u32>() };
    apply_mask_fallback(prefix, mask);
    let head = prefix.len() & 3;
    let mask_u32 = if head > 0 {
        if cfg!(target_endian = "big") {
            mask_u32.rotate_left(8 * head as u32)
        } else {
            mask_u32.rotate_right(8 * head as u32)
        }
    } else {
        mask_u32
    };
    for word in words.iter_mut() {
        *word ^= mask_u32;
    }
    apply_mask_fallback(suffix, mask_u32.to_ne_bytes());
}
