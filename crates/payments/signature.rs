use anyhow::{Result, anyhow};
use hmac::{Hmac, Mac};
use rust_decimal::{Decimal, RoundingStrategy};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Alif's two-step HMAC-SHA256 token.
///
/// Step one derives a hex key from the merchant credentials, step two signs
/// `merchant_id ++ order_id ++ amount(2dp) ++ callback_url` with it.
///
/// The two directions derive the step-one key differently, and the gateway rejects
/// anything else:
/// - outgoing payment requests use key = merchant id, message = secret
/// - incoming callbacks use key = secret, message = merchant id
#[derive(Clone)]
pub struct AlifSignature {
    merchant_id: String,
    secret: String,
}

impl AlifSignature {
    pub fn new(merchant_id: String, secret: String) -> Self {
        Self {
            merchant_id,
            secret,
        }
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    /// Token attached to a payment-creation request.
    pub fn request_token(
        &self,
        order_id: &str,
        amount: Decimal,
        callback_url: &str,
    ) -> Result<String> {
        let first = hmac_hex(self.merchant_id.as_bytes(), self.secret.as_bytes())?;
        self.final_token(&first, order_id, &format_amount(amount), callback_url)
    }

    /// Token the gateway is expected to attach to a callback.
    pub fn callback_token(
        &self,
        order_id: &str,
        amount: Decimal,
        callback_url: &str,
    ) -> Result<String> {
        let first = self.callback_key()?;
        self.final_token(&first, order_id, &format_amount(amount), callback_url)
    }

    /// Recomputes the callback token from the callback's own claims and compares it in
    /// constant time. Malformed hex never matches.
    pub fn verify_callback(
        &self,
        order_id: &str,
        amount: Decimal,
        callback_url: &str,
        provided_token: &str,
    ) -> Result<bool> {
        let Ok(provided) = hex::decode(provided_token.trim()) else {
            return Ok(false);
        };

        let first = self.callback_key()?;
        let message = self.signed_message(order_id, &format_amount(amount), callback_url);
        let mut mac = new_mac(first.as_bytes())?;
        mac.update(message.as_bytes());

        Ok(mac.verify_slice(&provided).is_ok())
    }

    fn callback_key(&self) -> Result<String> {
        hmac_hex(self.secret.as_bytes(), self.merchant_id.as_bytes())
    }

    fn final_token(
        &self,
        first_token: &str,
        order_id: &str,
        amount_2dp: &str,
        callback_url: &str,
    ) -> Result<String> {
        let message = self.signed_message(order_id, amount_2dp, callback_url);
        hmac_hex(first_token.as_bytes(), message.as_bytes())
    }

    fn signed_message(&self, order_id: &str, amount_2dp: &str, callback_url: &str) -> String {
        format!("{}{}{}{}", self.merchant_id, order_id, amount_2dp, callback_url)
    }
}

/// Formats an amount exactly as it is signed: two decimal places, half away from zero.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

fn new_mac(key: &[u8]) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(key).map_err(|err| anyhow!("invalid hmac key: {err}"))
}

fn hmac_hex(key: &[u8], message: &[u8]) -> Result<String> {
    let mut mac = new_mac(key)?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MERCHANT_ID: &str = "656374";
    const SECRET: &str = "QipCWXJGf39yJA77W5np";
    const ORDER_ID: &str = "SAKINA_1718000000000_k3j9x2abc";
    const CALLBACK_URL: &str = "https://api.sakina.tj/api/v1/payments/alif/callback";

    fn signer() -> AlifSignature {
        AlifSignature::new(MERCHANT_ID.to_string(), SECRET.to_string())
    }

    #[test]
    fn formats_amounts_with_two_decimals() {
        assert_eq!(format_amount(Decimal::from(1000)), "1000.00");
        assert_eq!(format_amount(Decimal::new(105, 1)), "10.50");
        assert_eq!(format_amount(Decimal::new(10005, 3)), "10.01");
        assert_eq!(format_amount(Decimal::new(123456, 2)), "1234.56");
    }

    #[test]
    fn request_token_uses_merchant_id_as_first_key() {
        assert_eq!(
            hmac_hex(MERCHANT_ID.as_bytes(), SECRET.as_bytes()).unwrap(),
            "d1570d15e3bba6a91b5f40119b35048e1e5c5adfe6522cdc732b5249820e0823"
        );
        assert_eq!(
            signer()
                .request_token(ORDER_ID, Decimal::from(1000), CALLBACK_URL)
                .unwrap(),
            "56c40370a07003bc2977e1f427776ac00c95e4b73b8a14c6c502e832cba0e23d"
        );
    }

    #[test]
    fn callback_token_uses_secret_as_first_key() {
        assert_eq!(
            signer().callback_key().unwrap(),
            "ec29782e6b23d9fd9aa4b66ebd989ba8370c438f260a5d93e587aed4a9293842"
        );
        assert_eq!(
            signer()
                .callback_token(ORDER_ID, Decimal::from(1000), CALLBACK_URL)
                .unwrap(),
            "2b146f473ee998da00b594890c94be0dc13229af2075e7ef1139e041dfb47b60"
        );
    }

    #[test]
    fn request_and_callback_tokens_differ() {
        let signer = signer();
        let request = signer
            .request_token(ORDER_ID, Decimal::from(1000), CALLBACK_URL)
            .unwrap();
        let callback = signer
            .callback_token(ORDER_ID, Decimal::from(1000), CALLBACK_URL)
            .unwrap();

        assert_ne!(request, callback);
        assert!(
            !signer
                .verify_callback(ORDER_ID, Decimal::from(1000), CALLBACK_URL, &request)
                .unwrap()
        );
    }

    #[test]
    fn verifies_its_own_callback_token() {
        let signer = signer();
        let amount = Decimal::new(24990, 2);
        let token = signer.callback_token(ORDER_ID, amount, CALLBACK_URL).unwrap();

        assert!(signer.verify_callback(ORDER_ID, amount, CALLBACK_URL, &token).unwrap());
        assert!(
            signer
                .verify_callback(ORDER_ID, amount, CALLBACK_URL, &token.to_uppercase())
                .unwrap()
        );
        // 249.9 and 249.90 sign identically.
        assert!(
            signer
                .verify_callback(ORDER_ID, Decimal::new(2499, 1), CALLBACK_URL, &token)
                .unwrap()
        );
    }

    #[test]
    fn any_perturbed_field_fails_verification() {
        let signer = signer();
        let amount = Decimal::from(1000);
        let token = signer.callback_token(ORDER_ID, amount, CALLBACK_URL).unwrap();

        assert!(
            !signer
                .verify_callback("SAKINA_1718000000000_k3j9x2abd", amount, CALLBACK_URL, &token)
                .unwrap()
        );
        assert!(
            !signer
                .verify_callback(ORDER_ID, Decimal::new(100001, 2), CALLBACK_URL, &token)
                .unwrap()
        );
        assert!(
            !signer
                .verify_callback(ORDER_ID, amount, "https://evil.example/callback", &token)
                .unwrap()
        );

        let other_merchant = AlifSignature::new("656375".to_string(), SECRET.to_string());
        assert!(
            !other_merchant
                .verify_callback(ORDER_ID, amount, CALLBACK_URL, &token)
                .unwrap()
        );

        let other_secret = AlifSignature::new(MERCHANT_ID.to_string(), "other".to_string());
        assert!(
            !other_secret
                .verify_callback(ORDER_ID, amount, CALLBACK_URL, &token)
                .unwrap()
        );
    }

    #[test]
    fn single_decimal_amount_does_not_match() {
        let signer = signer();
        let key = signer.callback_key().unwrap();
        let one_decimal = signer
            .final_token(&key, ORDER_ID, "1000.0", CALLBACK_URL)
            .unwrap();

        assert!(
            !signer
                .verify_callback(ORDER_ID, Decimal::from(1000), CALLBACK_URL, &one_decimal)
                .unwrap()
        );
    }

    #[test]
    fn malformed_tokens_never_match() {
        let signer = signer();
        for token in ["", "not-hex", "abc"] {
            assert!(
                !signer
                    .verify_callback(ORDER_ID, Decimal::from(1000), CALLBACK_URL, token)
                    .unwrap()
            );
        }
    }
}
