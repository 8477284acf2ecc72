//! Callsign seed codes.
//! Code format: FT-<WORD><NN>, e.g., FT-VIPER42, FT-GHOST07

use sha2::{Digest, Sha256};

const PREFIX: &str = "FT";

pub const CALLSIGNS: [&str; 64] = [
    "ALPHA", "BRAVO", "CHARLIE", "DELTA", "ECHO", "FOXTROT", "GHOST", "HAMMER", "IRON", "JACKAL",
    "KILO", "LANCER", "MAVERICK", "NOMAD", "ONYX", "PHANTOM", "QUARTZ", "RAVEN", "SABRE",
    "TANGO", "UMBRA", "VIPER", "WRAITH", "XRAY", "YANKEE", "ZULU", "ANVIL", "BANSHEE", "COBRA",
    "DAGGER", "EAGLE", "FALCON", "GRIZZLY", "HAVOC", "INDIGO", "JAVELIN", "KESTREL", "LYNX",
    "MAMBA", "NEEDLE", "OUTLAW", "PYTHON", "RANGER", "SHADOW", "TALON", "VULCAN", "WARDEN",
    "ARROW", "BISON", "CONDOR", "DRIFT", "EMBER", "FROST", "GRANITE", "HORNET", "ICARUS",
    "JAGUAR", "KRAKEN", "LOCUST", "MUSTANG", "NOVA", "ORCA", "REAPER", "SPARTAN",
];

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    (word_index & 0x3F) | ((u16::from(nn) & 0x7F) << 6)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    (packed & 0x3F, ((packed >> 6) & 0x7F) as u8)
}

fn compose_seed(word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    let digest = Sha256::new()
        .chain_update(b"FIRETEAM-")
        .chain_update(packed.to_le_bytes())
        .finalize();
    let mut high = [0_u8; 8];
    high.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(high) & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Render the callsign for a seed. Only the low 16 bits participate.
#[must_use]
pub fn encode_callsign(seed: u64) -> String {
    let (wi, nn) = unpack((seed & 0xFFFF) as u16);
    let word = CALLSIGNS.get(usize::from(wi)).copied().unwrap_or("ALPHA");
    format!("{PREFIX}-{word}{:02}", nn % 100)
}

/// Resolve a callsign code back to its canonical seed.
#[must_use]
pub fn decode_callsign(code: &str) -> Option<u64> {
    let (prefix, rest) = code.trim().split_once('-')?;
    if !prefix.eq_ignore_ascii_case(PREFIX) || rest.len() < 3 || !rest.is_ascii() {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = CALLSIGNS.iter().position(|w| *w == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some(compose_seed(wi, nn))
}

/// Accept either a decimal seed or a callsign code.
#[must_use]
pub fn parse_seed(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    trimmed
        .parse::<u64>()
        .ok()
        .or_else(|| decode_callsign(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ft_viper_42_is_stable() {
        let seed = decode_callsign("FT-VIPER42").unwrap();
        assert_eq!(encode_callsign(seed), "FT-VIPER42");
        assert_eq!(decode_callsign("ft-viper42"), Some(seed));
    }

    #[test]
    fn every_callsign_word_round_trips() {
        for (wi, word) in CALLSIGNS.iter().enumerate() {
            let code = format!("FT-{word}{:02}", wi % 100);
            let seed = decode_callsign(&code).unwrap();
            assert_eq!(encode_callsign(seed), code);
        }
    }

    #[test]
    fn malformed_codes_are_rejected() {
        assert_eq!(decode_callsign("XX-VIPER42"), None);
        assert_eq!(decode_callsign("FT-NOTAWORD42"), None);
        assert_eq!(decode_callsign("FT-VIPERx2"), None);
        assert_eq!(decode_callsign("FT-42"), None);
    }

    #[test]
    fn parse_seed_accepts_numbers_and_codes() {
        assert_eq!(parse_seed(" 1337 "), Some(1337));
        assert!(parse_seed("FT-GHOST07").is_some());
        assert_eq!(parse_seed("ghost"), None);
    }
}
