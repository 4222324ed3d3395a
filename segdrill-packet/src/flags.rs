//! tcpdump-style TCP flag specs
//!
//! A flag spec such as `"S."` or `"P.2"` names the control bits of a
//! segment one character each: `F` FIN, `S` SYN, `R` RST, `P` PSH and `.`
//! ACK. The ECN bits can be written either as letters or as a digit 0-7
//! packing ECE (bit 0), CWR (bit 1) and AE/NS (bit 2). How the two
//! notations may mix depends on the [`FlagGrammar`].

use crate::tcp::TcpFlags;
use segdrill_core::{Error, FlagGrammar, Result};

/// Alphabet of the strict ACE grammar, most common flag first
pub const STRICT_FLAGS: &str = ".FSRPEWA01234567";

/// Alphabet of the permissive shorthand grammar
pub const PERMISSIVE_FLAGS: &str = ".FSRPEWN01234567";

/// Digits encoding the three ECN bits at once
pub const ACE_FLAGS: &str = "01234567";

const STRICT_ECN_FLAGS: &str = "EWA";
const PERMISSIVE_ECN_FLAGS: &str = "EWN";

/// Characters accepted by `grammar`
pub fn alphabet(grammar: FlagGrammar) -> &'static str {
    match grammar {
        FlagGrammar::StrictAce => STRICT_FLAGS,
        FlagGrammar::PermissiveShorthand => PERMISSIVE_FLAGS,
    }
}

fn ecn_letters(grammar: FlagGrammar) -> &'static str {
    match grammar {
        FlagGrammar::StrictAce => STRICT_ECN_FLAGS,
        FlagGrammar::PermissiveShorthand => PERMISSIVE_ECN_FLAGS,
    }
}

/// Check that every character of `spec` is valid for `grammar`.
///
/// Under [`FlagGrammar::StrictAce`] a digit is the whole ACE field, so it
/// may appear at most once and never next to `E`, `W` or `A`; the error
/// names the character at which the clash was seen.
pub fn validate(spec: &str, grammar: FlagGrammar) -> Result<()> {
    let valid = alphabet(grammar);
    let ecn = ecn_letters(grammar);
    let mut has_ecn_flag = false;
    let mut has_ace_flag = false;

    for c in spec.chars() {
        if !valid.contains(c) {
            return Err(Error::InvalidFlag(c));
        }
        if grammar != FlagGrammar::StrictAce {
            continue;
        }
        if ecn.contains(c) {
            if has_ace_flag {
                return Err(Error::ConflictingFlag(c));
            }
            has_ecn_flag = true;
        }
        if ACE_FLAGS.contains(c) {
            if has_ecn_flag || has_ace_flag {
                return Err(Error::ConflictingFlag(c));
            }
            has_ace_flag = true;
        }
    }
    Ok(())
}

fn digit_value(c: char) -> Option<u8> {
    ACE_FLAGS.contains(c).then(|| c as u8 - b'0')
}

/// Decode an already validated spec into header bits
fn decode(spec: &str, grammar: FlagGrammar) -> TcpFlags {
    let has = |flag: char| spec.contains(flag);
    let mut flags = TcpFlags {
        fin: has('F'),
        syn: has('S'),
        rst: has('R'),
        psh: has('P'),
        ack: has('.'),
        ..TcpFlags::NONE
    };

    match grammar {
        FlagGrammar::StrictAce => {
            // validation guarantees at most one digit and no ECN letters
            // alongside it; a zero digit leaves all three bits clear
            match spec.chars().find_map(digit_value) {
                Some(ace) if ace != 0 => flags.set_ace(ace),
                _ => {
                    flags.ece = has('E');
                    flags.cwr = has('W');
                    flags.ae = has('A');
                }
            }
        }
        FlagGrammar::PermissiveShorthand => {
            let ace = spec.chars().filter_map(digit_value).fold(0, |acc, d| acc | d);
            flags.set_ace(ace);
            flags.ece |= has('E');
            flags.cwr |= has('W');
            flags.ae |= has('N');
        }
    }
    flags
}

/// Validate `spec` and decode it into TCP header flags
pub fn parse(spec: &str, grammar: FlagGrammar) -> Result<TcpFlags> {
    validate(spec, grammar)?;
    Ok(decode(spec, grammar))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRICT: FlagGrammar = FlagGrammar::StrictAce;
    const PERMISSIVE: FlagGrammar = FlagGrammar::PermissiveShorthand;

    #[test]
    fn test_every_alphabet_char_is_valid() {
        for grammar in [STRICT, PERMISSIVE] {
            for c in alphabet(grammar).chars() {
                assert!(validate(&c.to_string(), grammar).is_ok(), "{}", c);
            }
        }
        assert!(validate("", STRICT).is_ok());
        assert!(validate("FSRP.EWA", STRICT).is_ok());
        assert!(validate("FSRP.EWN7531", PERMISSIVE).is_ok());
    }

    #[test]
    fn test_unknown_char_is_invalid() {
        for bad in ['U', 'x', '8', '9', ' ', 's', '-'] {
            let spec = format!("S{}", bad);
            assert_eq!(validate(&spec, STRICT), Err(Error::InvalidFlag(bad)));
            assert_eq!(validate(&spec, PERMISSIVE), Err(Error::InvalidFlag(bad)));
        }
        assert_eq!(validate("S.N", STRICT), Err(Error::InvalidFlag('N')));
        assert_eq!(validate("S.A", PERMISSIVE), Err(Error::InvalidFlag('A')));
    }

    #[test]
    fn test_strict_digit_and_letter_conflict() {
        for letter in ['E', 'W', 'A'] {
            for digit in ACE_FLAGS.chars() {
                let after = format!(".{}{}", letter, digit);
                assert_eq!(validate(&after, STRICT), Err(Error::ConflictingFlag(digit)));
                let before = format!(".{}{}", digit, letter);
                assert_eq!(validate(&before, STRICT), Err(Error::ConflictingFlag(letter)));
            }
        }
    }

    #[test]
    fn test_strict_two_digits_conflict() {
        assert_eq!(validate("S12", STRICT), Err(Error::ConflictingFlag('2')));
        assert_eq!(validate("33", STRICT), Err(Error::ConflictingFlag('3')));
        assert!(validate("S12", PERMISSIVE).is_ok());
    }

    #[test]
    fn test_strict_single_digit_decodes_to_ace() {
        for digit in ACE_FLAGS.chars() {
            let value = digit as u8 - b'0';
            let flags = parse(&format!("S{}", digit), STRICT).unwrap();
            assert!(flags.syn);
            assert_eq!(flags.ace(), value, "digit {}", digit);
        }

        let flags = parse("5", STRICT).unwrap();
        assert!(flags.ece);
        assert!(!flags.cwr);
        assert!(flags.ae);
    }

    #[test]
    fn test_letters_map_to_bits() {
        let flags = parse("FSRP.", STRICT).unwrap();
        assert!(flags.fin && flags.syn && flags.rst && flags.psh && flags.ack);
        assert_eq!(flags.ace(), 0);
        assert!(!flags.urg);

        let flags = parse(".EWA", STRICT).unwrap();
        assert!(flags.ack);
        assert_eq!(flags.ace(), 7);

        let flags = parse("SE", STRICT).unwrap();
        assert_eq!(flags.ace(), 1);
        assert!(!flags.ack);
    }

    #[test]
    fn test_permissive_ors_digits_and_letters() {
        let flags = parse(".E2", PERMISSIVE).unwrap();
        assert!(flags.ece);
        assert!(flags.cwr);
        assert!(!flags.ae);

        let flags = parse("S14", PERMISSIVE).unwrap();
        assert_eq!(flags.ace(), 5);

        let flags = parse("N", PERMISSIVE).unwrap();
        assert!(flags.ae);
        assert_eq!(flags.ace(), 4);
    }
}
