use serde::Serialize;

/// Renders a value as a query-string parameter.
pub trait QueryValue {
    fn to_query_value(&self) -> String;
}

macro_rules! display_query_value {
    ($($ty:ty),+ $(,)?) => {
        $(impl QueryValue for $ty {
            fn to_query_value(&self) -> String {
                self.to_string()
            }
        })+
    };
}

display_query_value!(str, String, bool, u8, u16, u32, u64, usize, i32, i64);

impl<T: QueryValue + ?Sized> QueryValue for &T {
    fn to_query_value(&self) -> String {
        (**self).to_query_value()
    }
}

/// Ordered query parameters; `None` values are skipped.
///
/// ```ignore
/// let params = QueryParams::new()
///     .opt("email", email)
///     .opt("callingData", Some(true))
///     .opt("max", max);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, key: &str, value: impl QueryValue) -> Self {
        self.0.push((key.to_owned(), value.to_query_value()));
        self
    }

    #[must_use]
    pub fn opt(self, key: &str, value: Option<impl QueryValue>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    /// Sets `key` only when `value` is true; a false flag is left to the
    /// server default.
    #[must_use]
    pub fn flag(self, key: &str, value: bool) -> Self {
        if value { self.set(key, true) } else { self }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
