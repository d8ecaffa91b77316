//! `define_port_error!` builds a `thiserror` enum plus one snake_case
//! constructor per variant, so adapters can write `Error::query(msg)`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum DockPortError {
            Offline => "dock offline",
            Jammed { dock: String } => "dock {dock} jammed",
            Busy { dock: String, attempts: u32 } => "dock {dock} busy after {attempts} attempts",
        }
    }

    #[test]
    fn unit_variants_get_plain_constructors() {
        assert_eq!(DockPortError::offline(), DockPortError::Offline);
        assert_eq!(DockPortError::offline().to_string(), "dock offline");
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = DockPortError::jammed("north");
        assert_eq!(err.to_string(), "dock north jammed");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = DockPortError::busy("south", 3_u32);
        assert_eq!(err.to_string(), "dock south busy after 3 attempts");
    }
}
