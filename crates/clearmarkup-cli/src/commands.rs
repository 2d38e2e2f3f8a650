use clearmarkup_db::{
    Conditions, Db, Fetched, OrderSpec, Primitive, Projection, Result, Row, Value,
};
use nu_ansi_term::Color::{Blue, Cyan, Green};
use tracing::info;

use crate::{
    cli::{ColumnArgs, Commands, QueryArgs},
    utils::Colored,
};

/// Applies the shared read options to a builder.
fn configure<'a, 'p, P: Primitive>(
    db: &'a mut Db<'p, P>,
    table: &str,
    query: QueryArgs,
) -> &'a mut Db<'p, P> {
    db.table(table)
        .filter(query.filters.into_iter().collect::<Conditions>());

    if !query.order.is_empty() {
        db.order_by(OrderSpec::from(query.order));
    }

    match (query.limit, query.offset) {
        (Some(limit), Some(offset)) => {
            db.limit((offset, limit));
        }
        (Some(limit), None) => {
            db.limit(limit);
        }
        _ => {}
    }

    if let Some((rel_table, column)) = query.rel {
        db.rel(
            rel_table,
            query.rel_where.into_iter().collect::<Conditions>(),
            column,
        );
    }

    db
}

/// Builds the projection: listed columns in order, transforms applied to the
/// columns they name. Transforms for unlisted columns add those columns.
fn projection(columns: ColumnArgs) -> Projection {
    if columns.columns.is_empty() && columns.transform.is_empty() {
        return Projection::All;
    }

    let mut transforms = columns.transform;
    let mut projection = Projection::columns();
    for column in columns.columns {
        projection = match transforms.iter().position(|(name, _)| *name == column) {
            Some(idx) => {
                let (_, operations) = transforms.remove(idx);
                projection.pipe(column, &operations)
            }
            None => projection.column(column),
        };
    }
    for (column, operations) in transforms {
        projection = projection.pipe(column, &operations);
    }
    projection
}

fn print_value(value: &Value) -> String {
    match value {
        Value::Null => format!("{}", Colored(Cyan, "null")),
        other => other.to_string(),
    }
}

fn print_row(row: &Row) {
    for (column, value) in row.iter() {
        info!("{}: {}", Colored(Blue, column), print_value(value));
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run<P: Primitive>(primitive: &P, command: Commands, json: bool) -> Result<()> {
    let mut db = Db::new(primitive);

    match command {
        Commands::Select {
            table,
            query,
            columns,
        } => {
            let rows = configure(&mut db, &table, query).select(projection(columns))?;
            if json {
                return print_json(&rows);
            }
            for (idx, row) in rows.iter().enumerate() {
                if idx > 0 {
                    info!("");
                }
                print_row(row);
            }
            info!("{} row(s)", Colored(Green, rows.len()));
        }
        Commands::Get {
            table,
            query,
            columns,
        } => {
            let fetched = configure(&mut db, &table, query).get(projection(columns))?;
            if json {
                return print_json(&fetched);
            }
            match fetched {
                Some(Fetched::Scalar(value)) => info!("{}", print_value(&value)),
                Some(Fetched::Row(row)) => print_row(&row),
                None => info!("No matching row"),
            }
        }
        Commands::Count { table, query } => {
            let count = configure(&mut db, &table, query).count()?;
            if json {
                return print_json(&count);
            }
            info!("{}", count);
        }
        Commands::Has { table, query } => {
            let found = configure(&mut db, &table, query).has()?;
            if json {
                return print_json(&found);
            }
            info!("{}", found);
        }
        Commands::Insert { table, values } => {
            let row = values.into_iter().collect::<Row>();
            let id = db.table(table).insert(&row)?;
            if json {
                return print_json(&serde_json::json!({ "id": id }));
            }
            info!("Inserted row {}", Colored(Green, id));
        }
        Commands::Update {
            table,
            values,
            filters,
        } => {
            let row = values.into_iter().collect::<Row>();
            let changed = db
                .table(table)
                .filter(filters.into_iter().collect::<Conditions>())
                .update(&row)?;
            if json {
                return print_json(&serde_json::json!({ "updated": changed }));
            }
            info!("Updated {} row(s)", Colored(Green, changed));
        }
        Commands::Delete { table, filters } => {
            let deleted = db
                .table(table)
                .filter(filters.into_iter().collect::<Conditions>())
                .delete()?;
            if json {
                return print_json(&serde_json::json!({ "deleted": deleted }));
            }
            info!("Deleted {} row(s)", Colored(Green, deleted));
        }
    }

    Ok(())
}
