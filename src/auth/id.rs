//! Strongly typed identifiers for sessions and upstream resources.
//!
//! Organization and machine identifiers are spliced into API path templates, so besides the
//! usual emptiness, whitespace, and length checks they reject URL delimiters, percent escapes,
//! and the dot segments `.` and `..` so a value always stays a single path segment.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;
const RESERVED_CHARS: [char; 5] = ['/', '\\', '?', '#', '%'];

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (session, organization, machine).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (session, organization, machine).
		kind: &'static str,
	},
	/// The identifier contains a URL delimiter.
	#[error("{kind} identifier contains the reserved character `{character}`.")]
	ReservedCharacter {
		/// Kind of identifier (session, organization, machine).
		kind: &'static str,
		/// Offending character.
		character: char,
	},
	/// The identifier is a relative path segment (`.` or `..`).
	#[error("{kind} identifier cannot be a dot segment.")]
	DotSegment {
		/// Kind of identifier (session, organization, machine).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (session, organization, machine).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { SessionId, "Identifier of the dashboard session that owns a token.", "Session" }
def_id! { OrganizationId, "Upstream organization identifier.", "Organization" }
def_id! { MachineId, "Upstream machine (equipment) identifier.", "Machine" }

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if let Some(character) = view.chars().find(|c| RESERVED_CHARS.contains(c)) {
		return Err(IdentifierError::ReservedCharacter { kind, character });
	}
	if matches!(view, "." | "..") {
		return Err(IdentifierError::DotSegment { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_padding_and_delimiters() {
		assert!(MachineId::new(" 123").is_err(), "Leading whitespace must be rejected.");
		assert!(MachineId::new("123 ").is_err(), "Trailing whitespace must be rejected.");
		assert_eq!(
			OrganizationId::new("12/34"),
			Err(IdentifierError::ReservedCharacter { kind: "Organization", character: '/' })
		);
		assert!(MachineId::new("1?x=2").is_err());
		assert!(SessionId::new("").is_err());

		let machine = MachineId::new("123456").expect("Numeric machine identifier should be valid.");

		assert_eq!(machine.as_ref(), "123456");
		assert_eq!(format!("{machine:?}"), "Machine(123456)");
	}

	#[test]
	fn identifiers_cannot_escape_their_path_segment() {
		assert_eq!(MachineId::new(".."), Err(IdentifierError::DotSegment { kind: "Machine" }));
		assert_eq!(OrganizationId::new("."), Err(IdentifierError::DotSegment { kind: "Organization" }));
		assert_eq!(
			MachineId::new("%2e%2e"),
			Err(IdentifierError::ReservedCharacter { kind: "Machine", character: '%' })
		);
		assert_eq!(
			MachineId::new("..\\admin"),
			Err(IdentifierError::ReservedCharacter { kind: "Machine", character: '\\' })
		);

		MachineId::new("...").expect("Three dots are an ordinary segment.");
		MachineId::new("v1.2").expect("Embedded dots are allowed.");
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let organization: OrganizationId =
			serde_json::from_str("\"4711\"").expect("Organization should deserialize.");

		assert_eq!(organization.as_ref(), "4711");
		assert!(serde_json::from_str::<OrganizationId>("\"with space\"").is_err());
		assert!(serde_json::from_str::<MachineId>("\"a#b\"").is_err());
	}

	#[test]
	fn length_limit_is_inclusive() {
		let exact = "7".repeat(IDENTIFIER_MAX_LEN);

		MachineId::new(&exact).expect("Exact length should succeed.");

		assert!(MachineId::new("7".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<SessionId, u8> = HashMap::from_iter([(
			SessionId::new("session-abc").expect("Session used for lookup should be valid."),
			3_u8,
		)]);

		assert_eq!(map.get("session-abc"), Some(&3));
	}
}
