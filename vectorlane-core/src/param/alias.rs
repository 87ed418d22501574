//! Alias requests. An alias is an alternate name resolving to one collection.

use super::named_request;

named_request! {
    /// Points a new alias at a collection.
    CreateAlias, CreateAliasBuilder => "CreateAlias" {
        collection_name: with_collection_name,
        alias: with_alias,
    }
}

named_request! {
    /// Re-points an existing alias at another collection.
    AlterAlias, AlterAliasBuilder => "AlterAlias" {
        collection_name: with_collection_name,
        alias: with_alias,
    }
}

named_request! {
    DropAlias, DropAliasBuilder => "DropAlias" {
        alias: with_alias,
    }
}

named_request! {
    HasAlias, HasAliasBuilder => "HasAlias" {
        alias: with_alias,
    }
}

named_request! {
    /// Resolves an alias to its collection.
    DescribeAlias, DescribeAliasBuilder => "DescribeAlias" {
        alias: with_alias,
    }
}

named_request! {
    /// Lists the aliases of a collection.
    ListAliases, ListAliasesBuilder => "ListAliases" {
        collection_name: with_collection_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::RequestParam;

    #[test]
    fn test_alias_validation() {
        let err = CreateAlias::builder()
            .with_collection_name("books")
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("alias"));

        let err = DropAlias::builder().with_alias("").build().unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_alter_alias() {
        let param = AlterAlias::builder()
            .with_collection_name("books_v2")
            .with_alias("books")
            .build()
            .unwrap();
        assert_eq!(param.alias(), "books");
        assert_eq!(param.collection_name(), "books_v2");
        assert_eq!(AlterAlias::METHOD, "AlterAlias");
    }
}
