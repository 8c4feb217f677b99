//! Shared entity fixture: orders with addresses, telephones and tags.
#![allow(dead_code)]

use relmap::prelude::*;

pub struct Shop {
    pub schemes: Schemes,
    pub country: EntityId,
    pub address: EntityId,
    pub order: EntityId,
    pub telephone: EntityId,
    pub tag: EntityId,
    pub person: EntityId,
}

pub fn country() -> EntityDef {
    EntityDef::new("Country")
        .column(Column::new("Id", ValueType::Int).at(&[0]))
        .column(Column::new("Name", ValueType::Text).at(&[1]))
        .column(Column::new("Code", ValueType::Text).at(&[2]))
}

pub fn address() -> EntityDef {
    EntityDef::new("Address")
        .column(Column::new("Id", ValueType::Int).at(&[0]))
        .column(Column::new("Street", ValueType::Text).at(&[1]))
        .column(Column::new("City", ValueType::Text).at(&[2]))
        .column(Column::new("CountryId", ValueType::Int).at(&[3]))
        .relation(RelationDef::new("Country", "Country").at(&[4]))
}

pub fn order() -> EntityDef {
    EntityDef::new("Order")
        .column(Column::new("Id", ValueType::Int).at(&[0]))
        .column(Column::new("Number", ValueType::Text).at(&[1]))
        .column(Column::new("AddressId", ValueType::Int).at(&[2]))
        .column(Column::new("OptionalAddressId", ValueType::Int).at(&[3]))
        .column(Column::new("CreatedAt", ValueType::Time).at(&[4]).with_scanner())
        .relation(RelationDef::new("Address", "Address").at(&[5]))
        .relation(RelationDef::new("OptionalAddress", "Address").at(&[6]))
        .relation(RelationDef::new("Telephones", "Telephone").at(&[7]))
        .relation(RelationDef::new("Tags", "Tag").at(&[8]))
}

pub fn telephone() -> EntityDef {
    EntityDef::new("Telephone")
        .column(Column::new("Id", ValueType::Int).at(&[0]))
        .column(Column::new("OrderId", ValueType::Int).at(&[1]))
        .column(Column::new("Number", ValueType::Text).at(&[2]))
}

pub fn tag() -> EntityDef {
    EntityDef::new("Tag")
        .column(Column::new("Id", ValueType::Int).at(&[0]))
        .column(Column::new("Label", ValueType::Text).at(&[1]))
}

pub fn person() -> EntityDef {
    EntityDef::new("Person")
        .column(Column::new("Id", ValueType::Int).at(&[0]))
        .column(Column::new("Name", ValueType::Text).at(&[1]))
        .column(Column::new("AddressId", ValueType::Int).at(&[2]))
        .column(Column::new("OptionalAddressId", ValueType::Int).at(&[3]))
        .relation(RelationDef::new("Address", "Address").at(&[4]))
        .relation(RelationDef::new("OptionalAddress", "Address").at(&[5]))
}

pub fn shop() -> Shop {
    shop_in(Schemes::new())
}

pub fn shop_in(mut schemes: Schemes) -> Shop {
    let country = schemes.add(country()).expect("country");
    let address = schemes.add(address()).expect("address");
    let order = schemes.add(order()).expect("order");
    let telephone = schemes.add(telephone()).expect("telephone");
    let tag = schemes.add(tag()).expect("tag");
    let person = schemes.add(person()).expect("person");
    Shop {
        schemes,
        country,
        address,
        order,
        telephone,
        tag,
        person,
    }
}
