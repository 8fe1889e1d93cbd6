/// Text-backed enum stored in VARCHAR columns and exchanged as lowercase strings.
macro_rules! string_enum {
	($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
		pub enum $name {
			$(#[serde(rename = $text)] $variant),+
		}

		impl $name {
			pub const ALL: &'static [$name] = &[$($name::$variant),+];

			pub fn as_str(&self) -> &'static str {
				match self {
					$($name::$variant => $text),+
				}
			}
		}

		impl ::std::fmt::Display for $name {
			fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
				f.write_str(self.as_str())
			}
		}

		impl ::std::str::FromStr for $name {
			type Err = crate::error::AppError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($text => Ok($name::$variant),)+
					other => Err(crate::error::AppError::ValidationFailed(format!(
						"invalid {}: {}",
						stringify!($name),
						other
					))),
				}
			}
		}
	};
}

pub mod admin;
pub mod approval;
pub mod audit;
pub mod dashboard;
pub mod dto;
pub mod ledger;
pub mod response;
pub mod user;

pub use admin::*;
pub use approval::*;
pub use audit::*;
pub use ledger::*;
pub use response::*;
pub use user::*;
