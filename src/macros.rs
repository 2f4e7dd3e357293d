/// Declares a typed row id for a table, parseable from the string form
/// used in cookies and directory names.
macro_rules! id_struct {
    ($id_struct_name:ident, $struct_name:ident $(,)?) => {
        #[doc = concat!("Database ID for a [`", stringify!($struct_name), "`].")]
        #[derive(
            sqlx::Type,
            serde::Serialize,
            serde::Deserialize,
            derive_more::From,
            derive_more::Into,
            derive_more::Display,
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
        )]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $id_struct_name(pub i64);

        impl std::str::FromStr for $id_struct_name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map($id_struct_name)
            }
        }
    };
}
