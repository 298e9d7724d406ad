//! Text attribute bitset for cell styling.

bitflags::bitflags! {
    /// Text rendering attributes of a cell.
    ///
    /// Attribute sets are merged with bitwise OR when translucent cells are
    /// composited over existing content.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Attributes: u8 {
        /// Bold / increased intensity.
        const BOLD = 1 << 0;
        /// Dim / decreased intensity.
        const DIM = 1 << 1;
        /// Italic.
        const ITALIC = 1 << 2;
        /// Underline.
        const UNDERLINE = 1 << 3;
        /// Blinking.
        const BLINK = 1 << 4;
        /// Inverse video (swap fg/bg).
        const INVERSE = 1 << 5;
        /// Hidden / concealed.
        const HIDDEN = 1 << 6;
        /// Strikethrough.
        const STRIKETHROUGH = 1 << 7;
    }
}

impl Attributes {
    /// The SGR parameter that enables this single attribute.
    ///
    /// Only meaningful for single-bit sets; used by the renderer when
    /// emitting incremental style changes.
    pub fn sgr_code(self) -> Option<u8> {
        if self == Attributes::BOLD {
            Some(1)
        } else if self == Attributes::DIM {
            Some(2)
        } else if self == Attributes::ITALIC {
            Some(3)
        } else if self == Attributes::UNDERLINE {
            Some(4)
        } else if self == Attributes::BLINK {
            Some(5)
        } else if self == Attributes::INVERSE {
            Some(7)
        } else if self == Attributes::HIDDEN {
            Some(8)
        } else if self == Attributes::STRIKETHROUGH {
            Some(9)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        assert!(Attributes::default().is_empty());
    }

    #[test]
    fn union_merges() {
        let a = Attributes::BOLD | Attributes::ITALIC;
        let b = Attributes::ITALIC | Attributes::UNDERLINE;
        let merged = a | b;
        assert!(merged.contains(Attributes::BOLD));
        assert!(merged.contains(Attributes::ITALIC));
        assert!(merged.contains(Attributes::UNDERLINE));
        assert!(!merged.contains(Attributes::BLINK));
    }

    #[test]
    fn sgr_codes_for_each_bit() {
        assert_eq!(Attributes::BOLD.sgr_code(), Some(1));
        assert_eq!(Attributes::STRIKETHROUGH.sgr_code(), Some(9));
        assert_eq!((Attributes::BOLD | Attributes::DIM).sgr_code(), None);
    }
}
