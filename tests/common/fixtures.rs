use serde_json::{Value, json};

/// A document with a list of friends, used by the end-to-end queries.
pub fn friends() -> Value {
    json!({
        "friends": [
            { "name": "Chris", "age": 23, "city": "New York" },
            { "name": "Emily", "age": 19, "city": "Atlanta" },
            { "name": "Joe", "age": 32, "city": "New York" },
            { "name": "Kevin", "age": 19, "city": "Atlanta" },
            { "name": "Michelle", "age": 27, "city": "Los Angeles" },
            { "name": "Robert", "age": 45, "city": "Manhattan" },
            { "name": "Sarah", "age": 31, "city": "New York" }
        ]
    })
}

/// Orders with nested line items, used by aggregation queries.
pub fn orders() -> Value {
    json!([
        { "id": "A1", "customer": { "name": "Ann", "tier": "gold" }, "lines": [
            { "sku": "p1", "qty": 2, "price": 9.5 },
            { "sku": "p2", "qty": 1, "price": 20 }
        ]},
        { "id": "B2", "customer": { "name": "Bob", "tier": "silver" }, "lines": [
            { "sku": "p1", "qty": 1, "price": 9.5 }
        ]},
        { "id": "C3", "customer": { "name": "Cleo", "tier": "gold" }, "lines": [] }
    ])
}
