//! Decimal string integer used for token amounts, values and gas prices

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unsigned integer kept as its decimal string to preserve precision.
///
/// Bridge backends return amounts as strings or as bare JSON numbers; both
/// deserialize into this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct U256(String);

impl U256 {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	pub fn zero() -> Self {
		Self("0".to_string())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Parse as u128 (gas prices and most token amounts fit)
	pub fn as_u128(&self) -> Result<u128, std::num::ParseIntError> {
		self.0.parse()
	}

	pub fn is_zero(&self) -> bool {
		self.0.chars().all(|c| c == '0')
	}

	/// Checks the stored value is a non-empty run of decimal digits
	pub fn validate(&self) -> Result<(), String> {
		if self.0.is_empty() {
			return Err("integer value cannot be empty".to_string());
		}
		if !self.0.chars().all(|c| c.is_ascii_digit()) {
			return Err(format!("'{}' is not a decimal integer", self.0));
		}
		Ok(())
	}

	fn parse_any(raw: &str) -> Result<Self, String> {
		if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
			return hex_to_decimal(hex)
				.map(Self)
				.ok_or_else(|| format!("invalid hex integer '{}'", raw));
		}
		let value = Self(raw.to_string());
		value.validate()?;
		Ok(value)
	}
}

/// Arbitrary-width hex to decimal, little-endian digit accumulation
fn hex_to_decimal(hex: &str) -> Option<String> {
	// Decimal digits, least significant first
	let mut digits: Vec<u8> = vec![0];
	for c in hex.chars() {
		let mut carry = c.to_digit(16)?;
		for digit in digits.iter_mut() {
			let value = u32::from(*digit) * 16 + carry;
			*digit = (value % 10) as u8;
			carry = value / 10;
		}
		while carry > 0 {
			digits.push((carry % 10) as u8);
			carry /= 10;
		}
	}
	while digits.len() > 1 && digits.last() == Some(&0) {
		digits.pop();
	}
	Some(digits.iter().rev().map(|d| char::from(b'0' + d)).collect())
}

impl std::fmt::Display for U256 {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<u128> for U256 {
	fn from(value: u128) -> Self {
		Self(value.to_string())
	}
}

impl From<u64> for U256 {
	fn from(value: u64) -> Self {
		Self(value.to_string())
	}
}

impl From<&str> for U256 {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl Serialize for U256 {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.0)
	}
}

impl<'de> Deserialize<'de> for U256 {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Text(String),
			Number(u128),
		}

		match Raw::deserialize(deserializer)? {
			Raw::Text(text) => Self::parse_any(&text).map_err(serde::de::Error::custom),
			Raw::Number(number) => Ok(Self::from(number)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parses_decimal_and_hex() {
		let decimal: U256 = serde_json::from_str("\"1500000000\"").unwrap();
		assert_eq!(decimal.as_u128().unwrap(), 1_500_000_000);

		let hex: U256 = serde_json::from_str("\"0x59682f00\"").unwrap();
		assert_eq!(hex.as_u128().unwrap(), 1_500_000_000);

		let number: U256 = serde_json::from_str("1500000000").unwrap();
		assert_eq!(number, decimal);
	}

	#[test]
	fn test_hex_wider_than_u128() {
		// 2^128
		let wide: U256 = serde_json::from_str("\"0x100000000000000000000000000000000\"").unwrap();
		assert_eq!(wide.as_str(), "340282366920938463463374607431768211456");
		assert!(wide.as_u128().is_err());
		assert!(wide.validate().is_ok());

		let empty: U256 = serde_json::from_str("\"0x\"").unwrap();
		assert!(empty.is_zero());
		let padded: U256 = serde_json::from_str("\"0x000a\"").unwrap();
		assert_eq!(padded.as_str(), "10");
	}

	#[test]
	fn test_rejects_garbage() {
		assert!(serde_json::from_str::<U256>("\"abc\"").is_err());
		assert!(serde_json::from_str::<U256>("\"\"").is_err());
		assert!(serde_json::from_str::<U256>("\"0xzz\"").is_err());
	}

	#[test]
	fn test_serializes_as_decimal_string() {
		let value = U256::from(42u64);
		assert_eq!(serde_json::to_string(&value).unwrap(), "\"42\"");
		assert!(U256::zero().is_zero());
		assert!(!value.is_zero());
	}
}
