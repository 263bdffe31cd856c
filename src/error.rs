use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	#[error("value is locked")]
	Locked,
	#[error("value is already linked")]
	AlreadyLinked,
	#[error("values are not linked")]
	NotLinked,
	#[error("a value can not be linked to itself")]
	SelfLink,
	#[error("link would create a cycle")]
	Cycle,
	#[error("invalid value: {0}")]
	Invalid(String),
	#[error("value is not present")]
	NotPresent,
	#[error("values belong to different graphs")]
	ForeignGraph,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
