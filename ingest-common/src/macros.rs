/// Implements `Serialize` for a type by serializing its `Display` output as a string.
#[macro_export]
macro_rules! impl_str_ser {
    ($type:ty) => {
        impl ::serde::Serialize for $type {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }
    };
}

/// Implements `Deserialize` for a type by parsing a string with its `FromStr` implementation.
///
/// `$expectation` describes valid input in error messages, for example `"a storage policy"`.
#[macro_export]
macro_rules! impl_str_de {
    ($type:ty, $expectation:expr) => {
        impl<'de> ::serde::Deserialize<'de> for $type {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = <::std::string::String as ::serde::Deserialize>::deserialize(deserializer)?;
                value.parse().map_err(|_| {
                    ::serde::de::Error::invalid_value(
                        ::serde::de::Unexpected::Str(&value),
                        &$expectation,
                    )
                })
            }
        }
    };
}

/// Implements string based `Serialize` and `Deserialize` for a type, see [`impl_str_ser`] and
/// [`impl_str_de`].
#[macro_export]
macro_rules! impl_str_serde {
    ($type:ty, $expectation:expr) => {
        $crate::impl_str_ser!($type);
        $crate::impl_str_de!($type, $expectation);
    };
}
