//! Display-safe masked representations of card data.
//!
//! Masked strings are the only form in which card numbers ever leave the
//! service. All functions here are pure: they mutate nothing and their only
//! effect is the decryption they delegate to [`CardCipher`].

use chrono::Datelike;

use crate::{crypto::codec::CardCipher, models::card::Card};

/// Returned whenever a number is missing or too short to mask safely.
pub const MASKED_PLACEHOLDER: &str = "**** **** **** ****";

/// Mask a plaintext card number.
///
/// Formats as four groups of four: three fixed mask groups plus the last
/// four characters of the input. Inputs shorter than four characters yield
/// the full placeholder — never a partial mask.
pub fn mask_number(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() < 4 {
        return MASKED_PLACEHOLDER.to_string();
    }
    let last4: String = chars[chars.len() - 4..].iter().collect();
    format!("**** **** **** {last4}")
}

/// Mask a stored (encrypted) card number.
///
/// Only the last four characters are ever decrypted into the result; the
/// full number stays inside the codec.
pub fn masked_encrypted_number(cipher: &CardCipher, stored: &str) -> String {
    if stored.is_empty() {
        return MASKED_PLACEHOLDER.to_string();
    }
    let last4 = cipher.decrypt_last_chars(stored, 4);
    if last4.chars().count() < 4 {
        return MASKED_PLACEHOLDER.to_string();
    }
    format!("**** **** **** {last4}")
}

/// Mask a card's stored number.
pub fn masked_card_number(cipher: &CardCipher, card: &Card) -> String {
    masked_encrypted_number(cipher, &card.number_encrypted)
}

/// Format a card's expiration date as `MM/YY`.
pub fn masked_expiration(card: &Card) -> String {
    format!(
        "{:02}/{:02}",
        card.expiration_date.month(),
        card.expiration_date.year() % 100
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::models::card::CardStatus;

    fn card_with(number_encrypted: String, expiration: NaiveDate) -> Card {
        Card {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            number_encrypted,
            cvv_encrypted: String::new(),
            holder_name: "TEST HOLDER".to_string(),
            expiration_date: expiration,
            balance_cents: 0,
            status: CardStatus::Active,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn masks_a_sixteen_char_number() {
        assert_eq!(mask_number("4111111111111234"), "**** **** **** 1234");
    }

    #[test]
    fn short_input_yields_full_placeholder() {
        for raw in ["", "1", "12", "123"] {
            assert_eq!(mask_number(raw), MASKED_PLACEHOLDER);
        }
        // Exactly four characters is the minimum maskable length.
        assert_eq!(mask_number("1234"), "**** **** **** 1234");
    }

    #[test]
    fn masks_an_encrypted_card_number() {
        let cipher = CardCipher::from_secret(Some("masking-test-key"));
        let stored = cipher.encrypt("5105105105105100").unwrap();
        let exp = NaiveDate::from_ymd_opt(2030, 7, 1).unwrap();
        let card = card_with(stored, exp);

        assert_eq!(masked_card_number(&cipher, &card), "**** **** **** 5100");
    }

    #[test]
    fn empty_or_short_stored_number_yields_placeholder() {
        let cipher = CardCipher::from_secret(Some("masking-test-key"));
        let exp = NaiveDate::from_ymd_opt(2030, 7, 1).unwrap();

        let empty = card_with(String::new(), exp);
        assert_eq!(masked_card_number(&cipher, &empty), MASKED_PLACEHOLDER);

        let short = card_with(cipher.encrypt("123").unwrap(), exp);
        assert_eq!(masked_card_number(&cipher, &short), MASKED_PLACEHOLDER);
    }

    #[test]
    fn legacy_plaintext_number_still_masks() {
        let cipher = CardCipher::from_secret(Some("masking-test-key"));
        let exp = NaiveDate::from_ymd_opt(2030, 7, 1).unwrap();
        let card = card_with("4111111111111234".to_string(), exp);

        assert_eq!(masked_card_number(&cipher, &card), "**** **** **** 1234");
    }

    #[test]
    fn expiration_formats_as_mm_yy() {
        let exp = NaiveDate::from_ymd_opt(2027, 3, 31).unwrap();
        let card = card_with(String::new(), exp);
        assert_eq!(masked_expiration(&card), "03/27");
    }
}
