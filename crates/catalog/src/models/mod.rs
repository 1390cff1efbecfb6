mod component;
mod usage;

pub(crate) use self::component::ComponentRow;
pub(crate) use self::usage::{AlgorithmRow, DetectionRow};
