//! Keystroke decoding: control bytes, CSI/SS3 sequences, and the Kitty
//! keyboard protocol.

use crate::events::{KeyCode, KeyEventKind, Modifiers, ParsedKey};

/// Decode an xterm-style modifier parameter (1 + bitmask).
pub(crate) fn decode_modifiers(param: u32) -> Modifiers {
    let bits = param.saturating_sub(1);
    let mut mods = Modifiers::empty();
    if bits & 1 != 0 {
        mods |= Modifiers::SHIFT;
    }
    if bits & 2 != 0 {
        mods |= Modifiers::ALT;
    }
    if bits & 4 != 0 {
        mods |= Modifiers::CTRL;
    }
    if bits & 8 != 0 {
        mods |= Modifiers::SUPER;
    }
    mods
}

/// Map a C0 control byte to a key, if it has a conventional meaning.
pub(crate) fn control_byte(byte: u8) -> Option<(KeyCode, Modifiers)> {
    match byte {
        0x00 => Some((KeyCode::Char(' '), Modifiers::CTRL)),
        0x08 => Some((KeyCode::Backspace, Modifiers::empty())),
        0x09 => Some((KeyCode::Tab, Modifiers::empty())),
        0x0A | 0x0D => Some((KeyCode::Enter, Modifiers::empty())),
        0x1B => Some((KeyCode::Escape, Modifiers::empty())),
        0x7F => Some((KeyCode::Backspace, Modifiers::empty())),
        0x01..=0x1A => {
            let ch = (byte - 1 + b'a') as char;
            Some((KeyCode::Char(ch), Modifiers::CTRL))
        }
        _ => None,
    }
}

/// Decode a CSI key sequence from its parameter bytes and final byte.
///
/// Returns `None` for sequences that are not keys (mouse, responses).
pub(crate) fn csi_key(params: &[u8], final_byte: u8, raw: &[u8]) -> Option<ParsedKey> {
    let fields = split_params(params);
    let first = fields.first().copied().flatten();
    let mods_param = fields.get(1).copied().flatten().unwrap_or(1);
    let modifiers = decode_modifiers(mods_param);

    let code = match final_byte {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'Z' => {
            return Some(ParsedKey {
                code: KeyCode::Tab,
                modifiers: modifiers | Modifiers::SHIFT,
                kind: KeyEventKind::Press,
                raw: raw.to_vec(),
            });
        }
        b'~' => tilde_key(first?)?,
        b'u' => return kitty_key(params, raw),
        _ => return None,
    };

    Some(ParsedKey {
        code,
        modifiers,
        kind: KeyEventKind::Press,
        raw: raw.to_vec(),
    })
}

/// Decode an SS3 (`ESC O`) sequence.
pub(crate) fn ss3_key(final_byte: u8, raw: &[u8]) -> Option<ParsedKey> {
    let code = match final_byte {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        _ => return None,
    };
    Some(ParsedKey {
        code,
        modifiers: Modifiers::empty(),
        kind: KeyEventKind::Press,
        raw: raw.to_vec(),
    })
}

/// Map a `CSI n ~` code to a key.
fn tilde_key(code: u32) -> Option<KeyCode> {
    Some(match code {
        1 | 7 => KeyCode::Home,
        2 => KeyCode::Insert,
        3 => KeyCode::Delete,
        4 | 8 => KeyCode::End,
        5 => KeyCode::PageUp,
        6 => KeyCode::PageDown,
        11..=15 => KeyCode::F((code - 10) as u8),
        17..=21 => KeyCode::F((code - 11) as u8),
        23 => KeyCode::F(11),
        24 => KeyCode::F(12),
        _ => return None,
    })
}

/// Decode a Kitty keyboard protocol sequence (`CSI code;mods:event u`).
fn kitty_key(params: &[u8], raw: &[u8]) -> Option<ParsedKey> {
    let text = std::str::from_utf8(params).ok()?;
    let mut fields = text.split(';');

    // First field: codepoint, possibly with ':'-separated alternates.
    let code_field = fields.next()?;
    let codepoint: u32 = code_field.split(':').next()?.parse().ok()?;

    // Second field: modifiers, possibly with ':'-separated event type.
    let mut modifiers = Modifiers::empty();
    let mut kind = KeyEventKind::Press;
    if let Some(mod_field) = fields.next() {
        let mut sub = mod_field.split(':');
        if let Some(mods) = sub.next()
            && let Ok(m) = mods.parse::<u32>()
        {
            modifiers = decode_modifiers(m);
        }
        if let Some(event) = sub.next() {
            kind = match event {
                "2" => KeyEventKind::Repeat,
                "3" => KeyEventKind::Release,
                _ => KeyEventKind::Press,
            };
        }
    }

    let code = match codepoint {
        9 => KeyCode::Tab,
        13 => KeyCode::Enter,
        27 => KeyCode::Escape,
        127 => KeyCode::Backspace,
        57358 => KeyCode::Insert,
        57359 => KeyCode::Delete,
        cp => KeyCode::Char(char::from_u32(cp)?),
    };

    Some(ParsedKey {
        code,
        modifiers,
        kind,
        raw: raw.to_vec(),
    })
}

/// Split CSI parameter bytes on `;`, parsing each numeric field.
fn split_params(params: &[u8]) -> Vec<Option<u32>> {
    if params.is_empty() {
        return Vec::new();
    }
    std::str::from_utf8(params)
        .map(|s| {
            s.split(';')
                .map(|field| field.split(':').next().and_then(|f| f.parse().ok()))
                .collect()
        })
        .unwrap_or_default()
}
