use common::{shop, shop_in, Shop};
use relmap::prelude::*;
use relmap::{JoinType, RelationRef};

mod common;

fn aliases(dependents: &Dependents) -> Vec<&str> {
    dependents
        .scan_targets
        .iter()
        .map(|t| t.alias.as_str())
        .collect()
}

#[test]
fn test_to_one_inline_to_many_deferred() {
    let Shop { schemes, order, .. } = shop();
    let (plan, dependents) =
        compile_dependents(&schemes, order, &["OptionalAddress", "Telephones", "Address"]);

    assert_eq!(dependents.scan_count(), 3);
    assert_eq!(
        aliases(&dependents),
        vec!["_order", "_order_optional_address", "_order_address"]
    );
    assert_eq!(dependents.scan_targets[0].field_index.as_slice(), &[] as &[usize]);
    assert_eq!(dependents.scan_targets[1].field_index.as_slice(), &[6]);
    assert_eq!(dependents.scan_targets[2].field_index.as_slice(), &[5]);

    assert_eq!(plan.joins().len(), 2);
    assert!(plan.joins().iter().all(|j| j.join_type == JoinType::Left));
    assert!(!plan.has_fan_out());

    assert_eq!(dependents.depends.len(), 1);
    let depends = &dependents.depends[0];
    assert_eq!(depends.field_index.as_slice(), &[7]);
    assert_eq!(depends.relation, RelationRef { entity: order, index: 2 });
    assert_eq!(depends.parent, order);
    assert_eq!(depends.parent_alias, "_order");
    assert!(depends.paths.is_empty());
}

#[test]
fn test_select_list_follows_scan_slots() {
    let Shop { schemes, order, .. } = shop();
    let (_, dependents) = compile_dependents(&schemes, order, &["Address"]);

    // five order columns, then four address columns
    assert_eq!(dependents.select.len(), 9);
    assert!(dependents.select[..5].iter().all(|c| c.slot == 0));
    assert!(dependents.select[5..].iter().all(|c| c.slot == 1));
    assert_eq!(
        dependents.select[5].render(schemes.dialect()),
        "`_order_address`.`id`"
    );
    assert!(dependents.select[4].scanner);
    assert_eq!(dependents.select[4].value_type, ValueType::Time);
}

#[test]
fn test_shared_prefix_joined_once() {
    let Shop { schemes, order, .. } = shop();
    let (plan, dependents) = compile_dependents(
        &schemes,
        order,
        &[
            "OptionalAddress.Country",
            "OptionalAddress",
            "OptionalAddress.Test.Test",
        ],
    );

    assert_eq!(
        aliases(&dependents),
        vec![
            "_order",
            "_order_optional_address",
            "_order_optional_address_country"
        ]
    );
    assert_eq!(dependents.scan_targets[2].field_index.as_slice(), &[6, 4]);
    assert_eq!(plan.joins().len(), 2);
    assert_eq!(
        plan.joins()[1].render(schemes.dialect()),
        "LEFT JOIN `country` AS `_order_optional_address_country` ON `_order_optional_address`.`country_id` = `_order_optional_address_country`.`id`"
    );
    assert!(dependents.depends.is_empty());
}

#[test]
fn test_unresolvable_paths_are_dropped() {
    let Shop { schemes, order, .. } = shop();
    let (plan, dependents) = compile_dependents(&schemes, order, &["Nope", "Address.Nope", ""]);
    assert_eq!(aliases(&dependents), vec!["_order", "_order_address"]);
    assert_eq!(plan.joins().len(), 1);
    assert!(dependents.depends.is_empty());
}

#[test]
fn test_many_to_many_deferred_with_suffixes() {
    let Shop { schemes, order, .. } = shop();
    let (plan, dependents) = compile_dependents(&schemes, order, &["Tags", "Tags.Order"]);
    assert!(plan.is_empty());
    assert_eq!(dependents.depends.len(), 1);
    assert_eq!(dependents.depends[0].field_index.as_slice(), &[8]);
    assert_eq!(dependents.depends[0].paths, vec!["Order"]);
}

#[test]
fn test_synthesized_reverse_relation_not_loaded() {
    let Shop { schemes, tag, .. } = shop();
    let (_, dependents) = compile_dependents(&schemes, tag, &["Order"]);
    assert_eq!(dependents.scan_count(), 1);
    assert!(dependents.depends.is_empty());
}

#[test]
fn test_nested_to_one_extends_field_index() {
    let Shop { schemes, person, .. } = shop();
    let mut compiler = QueryCompiler::new(&schemes, person);
    let dependents = compiler.compile_dependents(&["Address.Country"]);
    assert_eq!(dependents.scan_targets[2].field_index.as_slice(), &[4, 4]);
    assert_eq!(compiler.plan().joins().len(), 2);
}

#[test]
fn test_has_many_follow_up() {
    let Shop { schemes, order, .. } = shop();
    let (_, dependents) = compile_dependents(&schemes, order, &["Telephones"]);
    let follow_up = dependents.depends[0].follow_up(&schemes, 2).unwrap();

    assert_eq!(
        follow_up.sql,
        "SELECT `_telephone`.`id`, `_telephone`.`order_id`, `_telephone`.`number` \
         FROM `telephone` AS `_telephone` WHERE `_telephone`.`order_id` IN (?, ?)"
    );
    assert_eq!(follow_up.scatter_column, "`_telephone`.`order_id`");
    assert_eq!(follow_up.placeholders, 2);
    assert_eq!(follow_up.dependents.scan_count(), 1);
}

#[test]
fn test_many_to_many_follow_up_goes_through_pivot() {
    let Shop { schemes, order, .. } = shop();
    let (_, dependents) = compile_dependents(&schemes, order, &["Tags"]);
    let follow_up = dependents.depends[0].follow_up(&schemes, 3).unwrap();

    assert_eq!(
        follow_up.sql,
        "SELECT `_tag`.`id`, `_tag`.`label`, `_tag_pivot`.`order_id` FROM `tag` AS `_tag` \
         JOIN `order_tag` AS `_tag_pivot` ON `_tag_pivot`.`tag_id` = `_tag`.`id` \
         WHERE `_tag_pivot`.`order_id` IN (?, ?, ?)"
    );
    assert_eq!(follow_up.scatter_column, "`_tag_pivot`.`order_id`");
}

#[test]
fn test_follow_up_carries_nested_paths() {
    let Shop { schemes, person, .. } = shop();
    let mut schemes = schemes;
    let account = schemes
        .add(
            EntityDef::new("Account")
                .column(Column::new("Id", ValueType::Int).at(&[0]))
                .relation(RelationDef::new("People", "Person").at(&[1])),
        )
        .unwrap();
    // `People` is many-to-many: neither side carries a foreign key.
    let (_, dependents) = compile_dependents(&schemes, account, &["People.Address"]);
    let follow_up = dependents.depends[0].follow_up(&schemes, 1).unwrap();

    assert_eq!(follow_up.dependents.scan_count(), 2);
    assert_eq!(follow_up.joins.len(), 1);
    assert_eq!(follow_up.dependents.scan_targets[0].entity, person);
    assert!(follow_up.sql.contains(
        "LEFT JOIN `address` AS `_person_address` ON `_person`.`address_id` = `_person_address`.`id`"
    ));
    assert!(follow_up.sql.ends_with("WHERE `_person_pivot`.`account_id` IN (?)"));
}

#[test]
fn test_follow_up_postgres_and_empty_keys() {
    let Shop { schemes, order, .. } =
        shop_in(Schemes::with_naming(SnakeCaseNaming::default(), Dialect::PostgreSQL));
    let (_, dependents) = compile_dependents(&schemes, order, &["Telephones"]);

    let follow_up = dependents.depends[0].follow_up(&schemes, 2).unwrap();
    assert!(follow_up.sql.ends_with(r#"WHERE "_telephone"."order_id" IN ($1, $2)"#));

    let empty = dependents.depends[0].follow_up(&schemes, 0).unwrap();
    assert!(empty.sql.ends_with("WHERE 1 = 0"));
}

#[test]
fn test_relation_to_unregistered_entity_is_dropped() {
    let mut schemes = Schemes::new();
    let order = schemes.add(common::order()).unwrap();
    let (plan, dependents) = compile_dependents(&schemes, order, &["Address"]);

    assert_eq!(dependents.scan_count(), 1);
    assert!(dependents.depends.is_empty());
    assert!(plan.is_empty());
}

#[test]
fn test_follow_up_junction_alias_does_not_collide() {
    let mut schemes = Schemes::new();
    let order = schemes
        .add(
            EntityDef::new("Order")
                .column(Column::new("Id", ValueType::Int).at(&[0]))
                .relation(RelationDef::new("Tags", "Tag").at(&[1])),
        )
        .unwrap();
    schemes
        .add(
            EntityDef::new("Tag")
                .column(Column::new("Id", ValueType::Int).at(&[0]))
                .column(Column::new("PivotId", ValueType::Int).at(&[1]))
                .relation(RelationDef::new("Pivot", "Label").at(&[2])),
        )
        .unwrap();
    schemes
        .add(EntityDef::new("Label").column(Column::new("Id", ValueType::Int).at(&[0])))
        .unwrap();

    let (_, dependents) = compile_dependents(&schemes, order, &["Tags.Pivot"]);
    let follow_up = dependents.depends[0].follow_up(&schemes, 1).unwrap();

    // `Pivot` on tag already took `_tag_pivot`
    assert_eq!(follow_up.joins[0].alias, "_tag_pivot");
    assert!(follow_up.sql.contains(
        "JOIN `order_tag` AS `_tag_pivot_2` ON `_tag_pivot_2`.`tag_id` = `_tag`.`id`"
    ));
    assert!(follow_up.sql.contains(
        "LEFT JOIN `label` AS `_tag_pivot` ON `_tag`.`pivot_id` = `_tag_pivot`.`id`"
    ));
    assert_eq!(follow_up.scatter_column, "`_tag_pivot_2`.`order_id`");
    assert!(follow_up.sql.ends_with("WHERE `_tag_pivot_2`.`order_id` IN (?)"));
}
