//! Conversion of "one name or many" arguments into a name list.

/// Types accepted by `fields`, `from` and `tables`: a single name or a
/// sequence of names.
pub trait IntoNames {
    /// Returns the names in order.
    fn into_names(self) -> Vec<String>;
}

impl IntoNames for &str {
    fn into_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoNames for String {
    fn into_names(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoNames for &String {
    fn into_names(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<S: Into<String>> IntoNames for Vec<S> {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: Into<String>, const N: usize> IntoNames for [S; N] {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: AsRef<str>> IntoNames for &[S] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_many() {
        assert_eq!("id".into_names(), vec!["id"]);
        assert_eq!(String::from("id").into_names(), vec!["id"]);
        assert_eq!(["id", "name"].into_names(), vec!["id", "name"]);
        assert_eq!(vec!["a", "b", "a"].into_names(), vec!["a", "b", "a"]);

        let owned = vec![String::from("x"), String::from("y")];
        assert_eq!(owned.as_slice().into_names(), vec!["x", "y"]);
    }
}
