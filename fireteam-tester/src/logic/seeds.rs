use anyhow::{Context, Result, bail};
use fireteam_game::{decode_callsign, encode_callsign};
use std::collections::HashSet;

/// Seed metadata used for simulation and reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self { seed, code: None }
    }

    #[must_use]
    pub fn from_callsign(seed: u64, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
        }
    }

    /// The callsign the user typed, or the canonical one for the seed.
    #[must_use]
    pub fn callsign(&self) -> String {
        self.code
            .clone()
            .unwrap_or_else(|| encode_callsign(self.seed))
    }
}

/// Resolve a list of CLI seed arguments into canonical seed metadata.
///
/// Supports literal integers, callsign codes, and the special keyword `all`
/// which expands to every callsign seed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_all = false;

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("all") {
            request_all = true;
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Some(seed) = decode_callsign(token) {
            pending.push(SeedInfo::from_callsign(seed, token.to_uppercase()));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    if request_all {
        pending.extend(all_callsign_seeds()?);
    }

    let mut seen: HashSet<u64> = HashSet::new();
    let mut deduped: Vec<SeedInfo> = Vec::new();
    for info in pending {
        if seen.insert(info.seed) {
            deduped.push(info);
        } else if info.code.is_some()
            && let Some(existing) = deduped
                .iter_mut()
                .find(|entry| entry.seed == info.seed && entry.code.is_none())
        {
            *existing = info;
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }

    Ok(deduped)
}

fn all_callsign_seeds() -> Result<Vec<SeedInfo>> {
    use fireteam_game::seed::CALLSIGNS;

    let mut seeds = Vec::with_capacity(CALLSIGNS.len() * 100);
    for word in CALLSIGNS {
        for suffix in 0..100 {
            let code = format!("FT-{word}{suffix:02}");
            let seed =
                decode_callsign(&code).with_context(|| format!("failed to parse callsign: {code}"))?;
            seeds.push(SeedInfo::from_callsign(seed, code));
        }
    }
    Ok(seeds)
}
