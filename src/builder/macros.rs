//! Macros for declaring state tag enums.

/// Declare a state tag enum with explicit tag strings.
///
/// Generates the enum with `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`,
/// `Debug` and serde derives, serializes each variant as its tag string,
/// implements [`State`](crate::core::State) with `name()` returning that
/// tag, and adds an `ALL` constant listing every variant.
///
/// The optional `final:` and `error:` lists drive `is_final` and `is_error`.
/// Both flags are informational; the engine does not gate on them.
///
/// The calling crate must depend on `serde` with the `derive` feature.
///
/// # Example
///
/// ```
/// use shapeshift::lifecycle_states;
/// use shapeshift::core::State;
///
/// lifecycle_states! {
///     pub enum UserState {
///         Created => "CREATED",
///         Verified => "VERIFIED",
///         Onboarded => "ONBOARDED",
///         Banned => "BANNED",
///     }
///     final: [Onboarded, Banned]
///     error: [Banned]
/// }
///
/// assert_eq!(UserState::Verified.name(), "VERIFIED");
/// assert_eq!(serde_json::to_string(&UserState::Created).unwrap(), "\"CREATED\"");
/// assert_eq!(UserState::ALL.len(), 4);
/// assert!(UserState::Banned.is_error());
/// ```
#[macro_export]
macro_rules! lifecycle_states {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $tag:literal
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
        $(error: [$($error:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $tag)]
                $variant
            ),*
        }

        impl $name {
            /// Every state, in declaration order.
            #[allow(dead_code)]
            pub const ALL: &'static [$name] = &[$(Self::$variant),*];
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => $tag),*
                }
            }

            #[allow(unreachable_patterns)]
            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    _ => false,
                }
            }

            #[allow(unreachable_patterns)]
            fn is_error(&self) -> bool {
                match self {
                    $($(Self::$error => true,)*)?
                    _ => false,
                }
            }
        }
    };
}
