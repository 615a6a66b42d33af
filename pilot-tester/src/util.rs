use anyhow::{Context, Result};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse seed tokens, accepting decimal or `0x`-prefixed hex.
pub fn parse_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    tokens
        .iter()
        .map(|token| {
            let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => token.parse::<u64>(),
            };
            parsed.with_context(|| format!("invalid seed {token:?}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" smoke, ,fuel,  soak ");
        assert_eq!(parts, vec!["smoke", "fuel", "soak"]);
    }

    #[test]
    fn seeds_accept_decimal_and_hex() {
        let seeds = parse_seeds(&split_csv("1337, 0xff,0XA")).unwrap();
        assert_eq!(seeds, vec![1337, 255, 10]);
    }

    #[test]
    fn bad_seed_names_the_token() {
        let err = parse_seeds(&["12x".to_string()]).unwrap_err();
        assert!(err.to_string().contains("12x"));
    }
}
