pub mod core;

/// Declares a public serde record. Struct attributes are passed through. `Option` fields
/// are omitted from the JSON when `None`, default to `None` when absent, and get a borrowing
/// getter.
#[macro_export]
macro_rules! serializable_record {
    ( @ [$($sattr:meta),*] $name:ident { } -> ($($fields:tt)*) ($($getters:tt)*) ) => (
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
        $(#[$sattr])*
        pub struct $name {
            $($fields)*
        }
        impl $name {
            $($getters)*
        }
    );
    ( @ [$($sattr:meta),*] $name:ident { $(#[$attr:meta])* $param:ident : Option<$type:ty>, $($rest:tt)* } -> ($($fields:tt)*) ($($getters:tt)*) ) => (
        serializable_record!(@ [$($sattr),*] $name { $($rest)* } -> (
            $($fields)*
            $(#[$attr])*
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub $param : Option<$type>,
        ) (
            $($getters)*
            pub fn $param(&self) -> Option<&$type> {
                self.$param.as_ref()
            }
        ));
    );
    ( @ [$($sattr:meta),*] $name:ident { $(#[$attr:meta])* $param:ident : $type:ty, $($rest:tt)* } -> ($($fields:tt)*) ($($getters:tt)*) ) => (
        serializable_record!(@ [$($sattr),*] $name { $($rest)* } -> (
            $($fields)*
            $(#[$attr])*
            pub $param : $type,
        ) (
            $($getters)*
        ));
    );
    ( $(#[$sattr:meta])* $name:ident { $( $rest:tt)* } ) => {
        serializable_record!(@ [$($sattr),*] $name { $($rest)* } -> () ());
    };
}
