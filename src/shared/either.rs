//! The "either one of two types" pattern

use serde::{Serialize, Deserialize, Serializer};

/// A value of one of two types. Used where a response shape depends on a
/// runtime branch — e.g. a task-augmented call returns `Either<CreateTaskResult, T>`:
/// an immediate task acknowledgement, or the direct result if the receiver
/// chose not to defer execution.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Either<L, R> {
    Left(L),
    Right(R),
}

impl<L, R> Serialize for Either<L, R>
where
    L: Serialize,
    R: Serialize,
{
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Either::Left(l) => l.serialize(serializer),
            Either::Right(r) => r.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_serializes_whichever_variant_is_set() {
        let left: Either<i32, String> = Either::Left(1);
        assert_eq!(serde_json::to_string(&left).unwrap(), "1");

        let right: Either<i32, String> = Either::Right("x".into());
        assert_eq!(serde_json::to_string(&right).unwrap(), "\"x\"");
    }
}
