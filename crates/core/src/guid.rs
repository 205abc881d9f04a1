use rand::Rng;

/// Four random lowercase hex digits.
fn hex_group(rng: &mut impl Rng) -> String {
    format!("{:04x}", rng.gen_range(0u32..0x1_0000))
}

fn generate_id(rng: &mut impl Rng) -> String {
    format!(
        "{}{}-{}-{}-{}-{}{}{}",
        hex_group(rng),
        hex_group(rng),
        hex_group(rng),
        hex_group(rng),
        hex_group(rng),
        hex_group(rng),
        hex_group(rng),
        hex_group(rng),
    )
}

/// GUID-shaped identifiers (8-4-4-4-12 lowercase hex). Deliberately not
/// RFC 4122: every group is independent randomness with no version or
/// variant bits, which is all the callers need.
pub fn generate_guids(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| generate_id(&mut rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn ids_have_guid_shape() {
        let format =
            Regex::new("^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap();
        for id in generate_guids(20) {
            assert!(format.is_match(&id), "bad id: {id}");
        }
    }

    #[test]
    fn consecutive_ids_differ() {
        let ids = generate_guids(2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn count_is_respected() {
        assert_eq!(generate_guids(0).len(), 0);
        assert_eq!(generate_guids(7).len(), 7);
    }
}
