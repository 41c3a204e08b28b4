//! Property-based tests for relationship types.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::model::{type_of, Tuple};

    /// Strategy to generate identifiers in type:id format
    fn identifier_strategy() -> impl Strategy<Value = String> {
        ("[a-z]{1,10}", "[a-z0-9]{1,20}").prop_map(|(t, id)| format!("{t}:{id}"))
    }

    /// Strategy to generate userset references in type:id#relation format
    fn userset_reference_strategy() -> impl Strategy<Value = String> {
        ("[a-z]{1,10}", "[a-z0-9]{1,10}", "[a-z]{1,10}")
            .prop_map(|(t, id, rel)| format!("{t}:{id}#{rel}"))
    }

    proptest! {
        #[test]
        fn test_type_of_recovers_type_prefix(
            obj_type in "[a-z]{1,10}",
            obj_id in "[a-z0-9:]{1,20}"
        ) {
            let value = format!("{obj_type}:{obj_id}");
            prop_assert_eq!(type_of(&value), obj_type.as_str());
        }

        #[test]
        fn test_userset_type_is_leading_type(user in userset_reference_strategy()) {
            let expected = user.split(':').next().unwrap().to_string();
            prop_assert_eq!(type_of(&user), expected.as_str());
        }

        #[test]
        fn test_tuple_key_preserves_field_order(
            user in identifier_strategy(),
            relation in "[a-z_]{1,12}",
            object in identifier_strategy()
        ) {
            let tuple = Tuple::new(user.clone(), relation.clone(), object.clone());
            prop_assert_eq!(tuple.key(), format!("{user}:{relation}:{object}"));
            prop_assert!(tuple.key().starts_with(&user));
            prop_assert!(tuple.key().ends_with(&object));
        }
    }
}
