//! CLI command implementations.

mod generate;
mod publish;
mod verify;

pub(crate) use generate::GenerateArgs;
pub(crate) use publish::PublishArgs;
pub(crate) use verify::VerifyArgs;
