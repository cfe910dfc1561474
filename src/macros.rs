/// Builds a state classification table: every listed spelling maps to the given state.
///
/// ```ignore
/// const TABLE: &[(&str, ServiceState)] = state_table! {
///     Ok => ["Onln", "Online"],
///     Critical => ["Failed"],
/// };
/// ```
macro_rules! state_table {
    ($( $state:ident => [$( $raw:expr ),* $(,)?] ),* $(,)?) => {
        &[
            $(
                $(
                    ($raw, $crate::ServiceState::$state),
                )*
            )*
        ]
    };
}

/// Joins a perfdata label with its `value;warn;crit;min;max` fields, dropping
/// trailing empty fields.
macro_rules! metric_string {
    ($name:expr, $( $field:expr ), *) => {
        {
            let mut s = String::new();
            s.push_str(&format!("{}=", $name));
            $(
                if let Some(v) = $field {
                    s.push_str(&v.to_string());
                }
                s.push(';');
            )*
            s.trim_end_matches(';').to_string()
        }
    };
}
