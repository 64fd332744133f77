use rand::Rng;

/// Receipt number for a new order: one uppercase letter followed by 4 to 8
/// zero-padded digits, e.g. `K00731`.
pub fn receipt_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    let letter = char::from(b'A' + rng.gen_range(0..26u8));
    let digits = rng.gen_range(4..=8usize);
    let number = rng.gen_range(0..10u64.pow(digits as u32));
    format!("{letter}{number:0digits$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn receipt_numbers_have_letter_and_padded_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let receipt = receipt_number(&mut rng);
            let (letter, digits) = receipt.split_at(1);

            assert!(letter.chars().all(|c| c.is_ascii_uppercase()), "{receipt}");
            assert!((4..=8).contains(&digits.len()), "{receipt}");
            assert!(digits.chars().all(|c| c.is_ascii_digit()), "{receipt}");
        }
    }
}
