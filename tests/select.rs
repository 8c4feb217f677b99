use common::{shop, shop_in, Shop};
use relmap::prelude::*;

mod common;

#[test]
fn test_full_statement() {
    let Shop { schemes, .. } = shop();
    let stmt = SelectBuilder::for_entity(&schemes, "order")
        .unwrap()
        .with(["Address", "Telephones"])
        .filter("Tags.Label = ?", ["gift"])
        .filter("Number != ?", ["A-1"])
        .order_by("CreatedAt DESC")
        .limit(20)
        .offset(40)
        .build()
        .unwrap();

    assert_eq!(
        stmt.sql,
        "SELECT `_order`.`id`, `_order`.`number`, `_order`.`address_id`, \
         `_order`.`optional_address_id`, `_order`.`created_at`, `_order_address`.`id`, \
         `_order_address`.`street`, `_order_address`.`city`, `_order_address`.`country_id` \
         FROM `order` AS `_order` \
         LEFT JOIN `address` AS `_order_address` ON `_order`.`address_id` = `_order_address`.`id` \
         JOIN `order_tag` AS `_order_tags_pivot` ON `_order_tags_pivot`.`order_id` = `_order`.`id` \
         JOIN `tag` AS `_order_tags` ON `_order_tags`.`id` = `_order_tags_pivot`.`tag_id` \
         WHERE (`_order_tags`.`label` = ?) AND (`_order`.`number` != ?) \
         GROUP BY `_order`.`id` ORDER BY `_order`.`created_at` DESC LIMIT 20 OFFSET 40"
    );
    assert_eq!(stmt.binds, vec!["gift", "A-1"]);
    assert_eq!(stmt.joins.len(), 3);
    assert_eq!(stmt.dependents.depends.len(), 1);
}

#[test]
fn test_condition_reuses_eager_join() {
    let Shop { schemes, order, .. } = shop();
    let stmt = SelectBuilder::new(&schemes, order)
        .with(["Address"])
        .filter("Address.City = ?", ["Delft"])
        .build()
        .unwrap();
    assert_eq!(stmt.joins.len(), 1);
    assert!(stmt.sql.ends_with("WHERE `_order_address`.`city` = ?"));
    assert!(!stmt.sql.contains("GROUP BY"));
}

#[test]
fn test_postgres_numbering_follows_clause_order() {
    let Shop { schemes, order, .. } =
        shop_in(Schemes::with_naming(SnakeCaseNaming::default(), Dialect::PostgreSQL));
    let stmt = SelectBuilder::new(&schemes, order)
        .filter("Id > ?", [1])
        .filter("Id < ? OR Id = ?", [10, 20])
        .build()
        .unwrap();
    assert!(stmt.sql.ends_with(
        r#"WHERE ("_order"."id" > $1) AND ("_order"."id" < $2 OR "_order"."id" = $3)"#
    ));
    assert_eq!(stmt.binds, vec![1, 10, 20]);
}

#[test]
fn test_errors_surface_from_build() {
    let Shop { schemes, order, .. } = shop();
    let err = SelectBuilder::<i64>::new(&schemes, order)
        .order_by("Nope.Id")
        .build()
        .unwrap_err();
    assert!(matches!(err, RelmapError::UnresolvableRelation { .. }));

    assert_eq!(
        SelectBuilder::<i64>::for_entity(&schemes, "Invoice").unwrap_err(),
        RelmapError::EntityNotFound("Invoice".into())
    );
}

#[test]
fn test_follow_up_for_statement_dependents() {
    let Shop { schemes, .. } = shop();
    let stmt = SelectBuilder::<&str>::for_entity(&schemes, "Order")
        .unwrap()
        .with(["Telephones", "Tags"])
        .build()
        .unwrap();
    let sqls: Vec<String> = stmt
        .dependents
        .depends
        .iter()
        .map(|d| d.follow_up(&schemes, 1).unwrap().sql)
        .collect();
    assert_eq!(sqls.len(), 2);
    assert!(sqls[0].starts_with("SELECT `_telephone`.`id`"));
    assert!(sqls[1].contains("JOIN `order_tag` AS `_tag_pivot`"));
}
