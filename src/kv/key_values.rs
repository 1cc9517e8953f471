//! Types that describe themselves as key/value pairs

use crate::core::FieldValue;
use std::collections::{BTreeMap, HashMap};

/// A value that can be logged field by field
///
/// Object fields are rendered as `prefix.field=value`. The default prefix is
/// the type's own name with a lower-cased first letter (`OrderLine` becomes
/// `orderLine`); maps use an empty prefix and emit their keys bare.
///
/// # Example
///
/// ```
/// use rust_log_relay::core::FieldValue;
/// use rust_log_relay::kv::KeyValues;
///
/// struct Order {
///     id: u64,
///     total: f64,
/// }
///
/// impl KeyValues for Order {
///     fn key_values(&self) -> Vec<(String, FieldValue)> {
///         vec![
///             ("id".to_string(), self.id.into()),
///             ("total".to_string(), self.total.into()),
///         ]
///     }
/// }
///
/// let order = Order { id: 7, total: 9.5 };
/// assert_eq!(order.prefix(), "order");
/// ```
pub trait KeyValues {
    fn key_values(&self) -> Vec<(String, FieldValue)>;

    fn prefix(&self) -> String {
        default_prefix(std::any::type_name::<Self>())
    }
}

/// `my_crate::model::OrderLine<T>` -> `orderLine`
pub(crate) fn default_prefix(type_name: &str) -> String {
    let path = type_name.split('<').next().unwrap_or(type_name);
    let short = path.rsplit("::").next().unwrap_or(path);

    let mut chars = short.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl<V, S> KeyValues for HashMap<String, V, S>
where
    V: Into<FieldValue> + Clone,
{
    fn key_values(&self) -> Vec<(String, FieldValue)> {
        let mut pairs: Vec<_> = self
            .iter()
            .map(|(k, v)| (k.clone(), v.clone().into()))
            .collect();
        // HashMap iteration order is random; keep rendered output stable
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    fn prefix(&self) -> String {
        String::new()
    }
}

impl<V> KeyValues for BTreeMap<String, V>
where
    V: Into<FieldValue> + Clone,
{
    fn key_values(&self) -> Vec<(String, FieldValue)> {
        self.iter()
            .map(|(k, v)| (k.clone(), v.clone().into()))
            .collect()
    }

    fn prefix(&self) -> String {
        String::new()
    }
}
