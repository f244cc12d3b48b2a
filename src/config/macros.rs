/// Configuration macros for zero-repetition config definitions
///
/// `config_struct!` declares a configuration section with its defaults inline:
/// field name, type and default value in one place. It generates the struct
/// with public fields, a `Default` impl built from the inline values, and serde
/// support with `#[serde(default)]` so any key may be omitted from the file.
///
/// # Example
/// ```
/// walletwatch::config_struct! {
///     pub struct ValuationConfig {
///         top_n: usize = 50,
///     }
/// }
/// assert_eq!(ValuationConfig::default().top_n, 50);
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
