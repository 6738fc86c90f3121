/// Defines an enum for an ELF field whose value has to come from a fixed list. Each
/// variant carries the raw value used in the file and a short name for display.
/// Values outside the list don't map to a variant so the parsers can reject them.
macro_rules! allow_list {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $repr:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr, $desc:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Returns None if value isn't one of the allowed values.
            pub fn from_raw(value: $repr) -> Option<Self> {
                match value {
                    $( v if v == $value => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// The value as it appears in the file.
            pub fn raw(self) -> $repr {
                match self {
                    $( $name::$variant => $value, )+
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $desc, )+
                }
            }
        }
    };
}
pub(crate) use allow_list;
