// Mirrors the tables created by ./migrations.
// The FTS5 table `bookmarks_fts` is only reached through raw SQL.

diesel::table! {
    bookmarks (id) {
        id -> Integer,
        url -> Text,
        title -> Text,
        description -> Nullable<Text>,
        date_added -> Timestamp,
        content_snippet -> Nullable<Text>,
        source -> Nullable<Text>,
    }
}

diesel::table! {
    tags (id) {
        id -> Integer,
        name -> Text,
        category -> Nullable<Text>,
        auto_generated -> Nullable<Bool>,
    }
}

diesel::table! {
    bookmark_tags (bookmark_id, tag_id) {
        bookmark_id -> Integer,
        tag_id -> Integer,
        confidence -> Nullable<Double>,
    }
}

diesel::joinable!(bookmark_tags -> bookmarks (bookmark_id));
diesel::joinable!(bookmark_tags -> tags (tag_id));

diesel::allow_tables_to_appear_in_same_query!(bookmarks, bookmark_tags, tags);
