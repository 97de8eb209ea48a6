//! Esquema Diesel (escrito a mano). Reemplazable con `diesel print-schema`.

diesel::table! {
    kv_strings (key) {
        key -> Text,
        value -> Text,
    }
}

diesel::table! {
    kv_hash_fields (key, field) {
        key -> Text,
        field -> Text,
        value -> Text,
    }
}

diesel::table! {
    kv_list_items (id) {
        id -> BigInt,
        key -> Text,
        value -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(kv_strings, kv_hash_fields, kv_list_items,);
