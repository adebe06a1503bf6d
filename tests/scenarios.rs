//! The literal end-to-end scenarios from the operation catalogue, run
//! against the in-memory stores end to end through `DictionaryService`.

use std::sync::Arc;

use dictionary_core::config::{DictionaryConfig, ValidatorOptions};
use dictionary_core::definition::{Constraints, DataDefinition, ScalarDefinition, ScalarType};
use dictionary_core::graph::{ChildData, ResponseFlags, SetEdgesRequest};
use dictionary_core::lang::LanguageTag;
use dictionary_core::predicate::{Direction, Predicate};
use dictionary_core::service::{namespace_term, DictionaryService};
use dictionary_core::store::memory::{MemoryGraphStore, MemoryLinkStore, MemoryTermStore};
use dictionary_core::term::{Code, Info, Term, TermHandle};
use indexmap::IndexMap;
use serde_json::json;

type Service = DictionaryService<MemoryTermStore, MemoryGraphStore, MemoryLinkStore>;

fn new_service() -> Service {
    DictionaryService::new(
        DictionaryConfig::default(),
        Arc::new(MemoryTermStore::new()),
        Arc::new(MemoryGraphStore::new()),
        Arc::new(MemoryLinkStore::new()),
    )
}

fn namespace(lid: &str, gid: &str) -> Term {
    Term {
        code: Code { lid: lid.to_owned(), gid: gid.to_owned(), ..Default::default() },
        info: Info::default(),
        data: None,
        rule: None,
    }
}

#[tokio::test]
async fn s1_insert_and_fetch() {
    let service = new_service();
    let english = LanguageTag::Iso6393("eng".to_owned());
    let term = namespace_term("test", "test", "Test term", &english);
    service.insert_term(term).await.unwrap();

    let fetched = service.get_term(&TermHandle::from("test")).await.unwrap();
    let title = service.localize(&fetched.info.title, &english).unwrap();
    assert_eq!(title, "Test term");
}

#[tokio::test]
async fn s2_delete_many_with_unknown() {
    let service = new_service();
    service.insert_term(namespace("test", "test")).await.unwrap();
    service.insert_term(namespace("test-01", "test-01")).await.unwrap();

    let report = service
        .delete_many_terms(&[
            TermHandle::from("test-01"),
            TermHandle::from("test-02"),
            TermHandle::from("UNKNOWN TERM"),
        ])
        .await
        .unwrap();

    assert_eq!(report.deleted, vec![TermHandle::from("test-01")]);
    assert_eq!(report.ignored.len(), 2);
}

#[tokio::test]
async fn s3_enumeration_check() {
    let service = new_service();
    let root = TermHandle::from("iso_639_1");
    service.insert_term(namespace("iso_639_1", "iso_639_1")).await.unwrap();
    service.insert_term(namespace("iso_639_1_en", "iso_639_1_en")).await.unwrap();
    service.insert_term(namespace("iso_639_1_fr", "iso_639_1_fr")).await.unwrap();

    let mut children: IndexMap<TermHandle, ChildData> = IndexMap::new();
    children.insert(TermHandle::from("iso_639_1_en"), None);
    children.insert(TermHandle::from("iso_639_1_fr"), None);
    service
        .set_edges(SetEdgesRequest {
            root: root.clone(),
            parent: root.clone(),
            predicate: Predicate::EnumOf,
            direction: Direction::ChildrenPointToParent,
            children,
            traversal_predicates: vec![],
            save: true,
            response: ResponseFlags::default(),
        })
        .await
        .unwrap();

    let report = service
        .check_keys(
            &root,
            &["iso_639_1_en".to_owned(), "iso_639_1_fr".to_owned(), "UNKNOWN".to_owned()],
        )
        .await
        .unwrap();

    assert_eq!(report.valid, vec!["iso_639_1_en".to_owned(), "iso_639_1_fr".to_owned()]);
    assert_eq!(report.invalid, vec!["UNKNOWN".to_owned()]);
}

#[tokio::test]
async fn s4_validate_scalar_enum() {
    let service = new_service();
    let root = TermHandle::from("_type");

    let mut type_term = namespace("_type", "_type");
    type_term.data = Some(DataDefinition::Scalar {
        class: None,
        scalar: ScalarDefinition {
            r#type: Some(ScalarType::StringEnum),
            kind: vec!["_type".to_owned()],
            constraints: Constraints::default(),
        },
    });
    service.insert_term(type_term).await.unwrap();
    service.insert_term(namespace("_type_string", "string")).await.unwrap();

    let mut children: IndexMap<TermHandle, ChildData> = IndexMap::new();
    children.insert(TermHandle::from("_type_string"), None);
    service
        .set_edges(SetEdgesRequest {
            root: root.clone(),
            parent: root.clone(),
            predicate: Predicate::EnumOf,
            direction: Direction::ChildrenPointToParent,
            children,
            traversal_predicates: vec![],
            save: true,
            response: ResponseFlags::default(),
        })
        .await
        .unwrap();

    let report = service
        .validate_descriptor("_type", &json!("string"), &LanguageTag::All, &ValidatorOptions::default())
        .await
        .unwrap();

    assert!(report.is_success(), "unexpected status: {:?}", report.status);
}

#[tokio::test]
async fn s5_validate_object_with_unknown_property() {
    let service = new_service();
    let object = json!({
        "_code": {"_lid": "test-01", "_gid": "test-01", "_aid": ["test-01"]},
        "_info": {"_title": {"iso_639_3_eng": "Test term 1"}},
        "_data": {"_scalar": {"_type": "object"}},
        "custom_value": 42,
    });

    let report = service
        .validate_object(&object, &LanguageTag::Iso6393("eng".to_owned()), &ValidatorOptions::default())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert!(report.status.message.contains("custom_value"));
}

#[tokio::test]
async fn s6_set_edges_reachability_failure() {
    let service = new_service();
    service.insert_term(namespace("R", "R")).await.unwrap();
    service.insert_term(namespace("P", "P")).await.unwrap();

    let err = service
        .set_edges(SetEdgesRequest {
            root: TermHandle::from("R"),
            parent: TermHandle::from("P"),
            predicate: Predicate::EnumOf,
            direction: Direction::ChildrenPointToParent,
            children: IndexMap::<TermHandle, ChildData>::new(),
            traversal_predicates: vec![],
            save: true,
            response: ResponseFlags::default(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, dictionary_core::error::DictionaryError::ParentNotInGraph { .. }));

    // No edge was written: the enumeration under R is still empty.
    let keys = service.all_keys(&TermHandle::from("R")).await.unwrap();
    assert!(keys.is_empty());
}
