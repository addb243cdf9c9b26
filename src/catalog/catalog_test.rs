use super::*;

const CATALOG_JSON: &str = r#"[
    {
        "id": "bar-magnolia",
        "name": "Magnolia Bar",
        "subtitle": "White oak front",
        "description": "Eight-foot bar with floral panel.",
        "quantity": 2,
        "dimensions": "96\" W x 42\" H",
        "category": "bars"
    },
    {
        "id": "decor-camellia",
        "name": "Camellia Arch",
        "category": "decor",
        "subcategory": "arches"
    },
    {
        "id": "decor-azalea",
        "name": "Azalea Backdrop",
        "category": "decor",
        "subcategory": "backdrops"
    }
]"#;

fn catalog() -> StaticCatalog {
    StaticCatalog::from_json(CATALOG_JSON).unwrap()
}

#[test]
fn from_json_parses_full_and_sparse_entries() {
    let catalog = catalog();
    assert_eq!(catalog.len(), 3);

    let bar = catalog.lookup("bar-magnolia").unwrap();
    assert_eq!(bar.subtitle.as_deref(), Some("White oak front"));
    assert_eq!(bar.quantity, Some(2));

    let arch = catalog.lookup("decor-camellia").unwrap();
    assert_eq!(arch.description, "");
    assert_eq!(arch.dimensions, None);
}

#[test]
fn lookup_unknown_id_is_none() {
    assert!(catalog().lookup("chair-lotus").is_none());
}

#[test]
fn duplicate_ids_are_rejected() {
    let dup = vec![ProductDetails::unresolved("a"), ProductDetails::unresolved("a")];
    assert!(matches!(StaticCatalog::new(dup), Err(CatalogError::DuplicateProduct(id)) if id == "a"));
}

#[test]
fn empty_ids_are_rejected() {
    assert!(matches!(StaticCatalog::new(vec![ProductDetails::unresolved(" ")]), Err(CatalogError::EmptyProductId)));
}

#[test]
fn malformed_json_is_parse_error() {
    assert!(matches!(StaticCatalog::from_json("{\"id\": 1}"), Err(CatalogError::Parse(_))));
}

#[test]
fn load_reads_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("catalog.json");
    std::fs::write(&path, CATALOG_JSON).unwrap();
    assert_eq!(StaticCatalog::load(&path).unwrap().len(), 3);
    assert!(matches!(StaticCatalog::load(&tmp.path().join("missing.json")), Err(CatalogError::Io(_))));
}

#[test]
fn in_category_filters_and_sorts_by_name() {
    let catalog = catalog();
    let decor: Vec<&str> = catalog.in_category("decor", None).iter().map(|p| p.id.as_str()).collect();
    assert_eq!(decor, vec!["decor-azalea", "decor-camellia"]);

    let arches: Vec<&str> = catalog.in_category("decor", Some("arches")).iter().map(|p| p.id.as_str()).collect();
    assert_eq!(arches, vec!["decor-camellia"]);

    assert!(catalog.in_category("linens", None).is_empty());
}

#[test]
fn resolve_entries_keeps_order_and_skips_unknown() {
    let catalog = catalog();
    let ids = vec!["decor-camellia".to_owned(), "retired-item".to_owned(), "bar-magnolia".to_owned()];
    let resolved = resolve_entries(&catalog, &ids);
    let names: Vec<&str> = resolved.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Camellia Arch", "Magnolia Bar"]);
}
