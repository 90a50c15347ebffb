//! Spreadsheet sales import
//!
//! Accepts CSV exported from whatever the shop kept its sales in: Spanish or
//! English headers, `;`, `,` or tab separated, European or US number
//! formats. Rows sharing an order number become one order with several
//! lines. Rows without a usable date or amount, or with an amount too large
//! to store, are reported, not imported.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared::catalog::normalize_search;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    OrderStatus, SalesChannel, SalesOrderCreate, SalesOrderItem, money_in_range,
};

/// Status given to imported rows that do not state one
const DEFAULT_IMPORT_STATUS: OrderStatus = OrderStatus::Paid;

const UNKNOWN_CUSTOMER: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("CSV input is empty")]
    Empty,
    #[error("No recognizable {0} column in header")]
    MissingColumn(&'static str),
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl From<ImportError> for AppError {
    fn from(e: ImportError) -> Self {
        AppError::with_message(ErrorCode::OrderImportFailed, e.to_string())
    }
}

/// A row left out of the import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based line in the uploaded file
    pub line: u64,
    pub reason: String,
}

/// One order read from the file
#[derive(Debug, Clone)]
pub struct ParsedOrder {
    /// Line of the order's first row
    pub line: u64,
    pub order: SalesOrderCreate,
}

/// Parsed orders plus the rows that were left out
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub orders: Vec<ParsedOrder>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Date,
    Customer,
    Email,
    Total,
    Channel,
    Status,
    OrderNumber,
    Item,
    Quantity,
    Notes,
}

impl Field {
    const ALL: [Field; 10] = [
        Field::Date,
        Field::Customer,
        Field::Email,
        Field::Total,
        Field::Channel,
        Field::Status,
        Field::OrderNumber,
        Field::Item,
        Field::Quantity,
        Field::Notes,
    ];

    /// Normalized header spellings
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::Date => &["fecha", "date", "dia", "order date", "fecha pedido", "fecha venta"],
            Field::Customer => &[
                "cliente", "customer", "nombre", "name", "comprador", "customer name",
            ],
            Field::Email => &["email", "e mail", "correo", "mail", "correo electronico"],
            Field::Total => &[
                "total", "importe", "amount", "precio", "price", "total eur", "monto",
            ],
            Field::Channel => &["canal", "channel", "origen", "source", "via"],
            Field::Status => &["estado", "status"],
            Field::OrderNumber => &[
                "pedido", "order", "numero", "n pedido", "nº pedido", "num pedido",
                "numero pedido", "order number", "referencia", "ref", "id",
            ],
            Field::Item => &[
                "producto", "product", "articulo", "item", "descripcion", "description",
                "concepto",
            ],
            Field::Quantity => &["cantidad", "qty", "quantity", "uds", "unidades"],
            Field::Notes => &["notas", "notes", "comentarios", "observaciones"],
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Customer => "customer",
            Field::Email => "email",
            Field::Total => "total",
            Field::Channel => "channel",
            Field::Status => "status",
            Field::OrderNumber => "order number",
            Field::Item => "item",
            Field::Quantity => "quantity",
            Field::Notes => "notes",
        }
    }
}

/// Pick the delimiter that splits the header line the most.
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut best = (b',', 0usize);
    for delimiter in [b';', b'\t', b','] {
        let mut in_quotes = false;
        let mut count = 0;
        for byte in header.bytes() {
            match byte {
                b'"' => in_quotes = !in_quotes,
                b if b == delimiter && !in_quotes => count += 1,
                _ => {}
            }
        }
        if count > best.1 {
            best = (delimiter, count);
        }
    }
    best.0
}

/// Map header cells to fields: exact alias first, then a header that starts
/// with an alias word ("Fecha del pedido").
fn map_headers(headers: &csv::StringRecord) -> HashMap<Field, usize> {
    let normalized: Vec<String> = headers.iter().map(normalize_search).collect();
    let mut columns = HashMap::new();

    for field in Field::ALL {
        let exact = normalized
            .iter()
            .position(|h| field.aliases().contains(&h.as_str()));
        if let Some(i) = exact {
            columns.entry(field).or_insert(i);
        }
    }
    for field in Field::ALL {
        if columns.contains_key(&field) {
            continue;
        }
        let taken: Vec<usize> = columns.values().copied().collect();
        let loose = normalized.iter().enumerate().position(|(i, h)| {
            !taken.contains(&i)
                && field
                    .aliases()
                    .iter()
                    .any(|a| h.starts_with(&format!("{a} ")))
        });
        if let Some(i) = loose {
            columns.insert(field, i);
        }
    }
    columns
}

/// Parse a money amount: `1.234,50 €`, `1,234.50`, `€12`, `-3,5`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .replace("EUR", "")
        .replace("eur", "")
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | '£') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');
    let normalized = match (last_dot, last_comma) {
        (Some(d), Some(c)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(c)) => {
            let decimals = cleaned.len() - c - 1;
            if cleaned.matches(',').count() == 1 && decimals != 3 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (Some(d), None) => {
            let decimals = cleaned.len() - d - 1;
            if cleaned.matches('.').count() > 1 || decimals == 3 {
                cleaned.replace('.', "")
            } else {
                cleaned
            }
        }
        (None, None) => cleaned,
    };

    Decimal::from_str(&normalized).ok().map(|d| d.round_dp(2))
}

/// Parse a calendar date into UTC midnight millis.
pub fn parse_date(raw: &str) -> Option<i64> {
    let token = raw.split_whitespace().next()?;
    let token = token.split('T').next()?;

    const LONG: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"];
    const SHORT: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];

    let date = LONG
        .iter()
        .filter_map(|f| NaiveDate::parse_from_str(token, f).ok())
        .find(|d| d.year() >= 1970)
        .or_else(|| {
            SHORT
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(token, f).ok())
        })?;

    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

/// Map a free-text channel to a known one.
pub fn parse_channel(raw: &str) -> SalesChannel {
    let text = normalize_search(raw);
    let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));
    if text.is_empty() {
        SalesChannel::Other
    } else if text.contains("insta") || text.split(' ').any(|w| w == "ig") {
        SalesChannel::Instagram
    } else if has(&["mayor", "wholesale", "tienda fisica", "reventa"]) {
        SalesChannel::Wholesale
    } else if has(&["mercad", "feria", "market", "fair"]) {
        SalesChannel::Market
    } else if has(&["web", "online", "shop", "tienda"]) {
        SalesChannel::Web
    } else {
        SalesChannel::Other
    }
}

/// Map a free-text status; `None` when unrecognized.
pub fn parse_status(raw: &str) -> Option<OrderStatus> {
    let text = normalize_search(raw);
    let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));
    if text.is_empty() {
        None
    } else if has(&["cancel", "anulad", "devuel", "refund"]) {
        Some(OrderStatus::Cancelled)
    } else if has(&["entregad", "deliver", "recibid"]) {
        Some(OrderStatus::Delivered)
    } else if has(&["enviad", "ship", "sent"]) {
        Some(OrderStatus::Shipped)
    } else if has(&["pagad", "paid", "cobrad"]) {
        Some(OrderStatus::Paid)
    } else if has(&["pendiente", "pending"]) {
        Some(OrderStatus::Pending)
    } else {
        None
    }
}

/// Order number for rows that do not carry one. Derived from the line and
/// its cells: re-importing the same file yields the same numbers, while
/// identical sales on different lines stay separate orders.
fn derived_order_number(placed_at: i64, line: u64, record: &csv::StringRecord) -> String {
    let mut hasher = Sha256::new();
    hasher.update(line.to_le_bytes());
    for cell in record.iter() {
        hasher.update(cell.as_bytes());
        hasher.update(b"\x1f");
    }
    let digest = hex::encode(hasher.finalize());
    let day = chrono::DateTime::from_timestamp_millis(placed_at)
        .map(|d| d.format("%Y%m%d").to_string())
        .unwrap_or_default();
    format!("IMP-{day}-{}", &digest[..8])
}

fn cell<'r>(
    record: &'r csv::StringRecord,
    columns: &HashMap<Field, usize>,
    field: Field,
) -> &'r str {
    columns
        .get(&field)
        .and_then(|&i| record.get(i))
        .map(str::trim)
        .unwrap_or("")
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Parse a whole CSV export.
pub fn parse_orders_csv(text: &str) -> Result<ImportOutcome, ImportError> {
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(ImportError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(text))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns = map_headers(reader.headers()?);
    for required in [Field::Date, Field::Total] {
        if !columns.contains_key(&required) {
            return Err(ImportError::MissingColumn(required.label()));
        }
    }

    let mut outcome = ImportOutcome::default();
    let mut by_number: HashMap<String, usize> = HashMap::new();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let skip = |reason: String| SkippedRow { line, reason };

        let raw_date = cell(&record, &columns, Field::Date);
        if raw_date.is_empty() {
            outcome.skipped.push(skip("missing date".into()));
            continue;
        }
        let Some(placed_at) = parse_date(raw_date) else {
            outcome.skipped.push(skip(format!("unreadable date '{raw_date}'")));
            continue;
        };

        let raw_total = cell(&record, &columns, Field::Total);
        if raw_total.is_empty() {
            outcome.skipped.push(skip("missing total".into()));
            continue;
        }
        let Some(line_total) = parse_amount(raw_total) else {
            outcome.skipped.push(skip(format!("unreadable amount '{raw_total}'")));
            continue;
        };
        if !money_in_range(line_total) {
            outcome.skipped.push(skip(format!("amount out of range '{raw_total}'")));
            continue;
        }

        let quantity = cell(&record, &columns, Field::Quantity)
            .parse::<u32>()
            .ok()
            .filter(|q| *q > 0)
            .unwrap_or(1);
        let item =
            non_empty(cell(&record, &columns, Field::Item)).map(|description| SalesOrderItem {
                product_id: None,
                description,
                quantity,
                unit_price: (line_total / Decimal::from(quantity)).round_dp(2),
            });

        let order_number = non_empty(cell(&record, &columns, Field::OrderNumber))
            .unwrap_or_else(|| derived_order_number(placed_at, line, &record));

        if let Some(&idx) = by_number.get(&order_number) {
            let order = &mut outcome.orders[idx].order;
            let total = order.total.unwrap_or_default() + line_total;
            if !money_in_range(total) {
                outcome.skipped.push(skip(format!("order {order_number} total out of range")));
                continue;
            }
            order.total = Some(total);
            order.items.extend(item);
            continue;
        }

        let status = parse_status(cell(&record, &columns, Field::Status))
            .unwrap_or(DEFAULT_IMPORT_STATUS);
        by_number.insert(order_number.clone(), outcome.orders.len());
        let order = SalesOrderCreate {
            order_number: Some(order_number),
            customer_name: non_empty(cell(&record, &columns, Field::Customer))
                .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string()),
            customer_email: non_empty(cell(&record, &columns, Field::Email)),
            channel: Some(parse_channel(cell(&record, &columns, Field::Channel))),
            status: Some(status),
            items: item.into_iter().collect(),
            total: Some(line_total),
            placed_at: Some(placed_at),
            notes: non_empty(cell(&record, &columns, Field::Notes)),
        };
        outcome.orders.push(ParsedOrder { line, order });
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("1.234,50 €"), Some(dec("1234.50")));
        assert_eq!(parse_amount("1,234.50"), Some(dec("1234.50")));
        assert_eq!(parse_amount("€12"), Some(dec("12")));
        assert_eq!(parse_amount("12,5"), Some(dec("12.5")));
        assert_eq!(parse_amount("12.50"), Some(dec("12.50")));
        assert_eq!(parse_amount("1.234"), Some(dec("1234")));
        assert_eq!(parse_amount("35 EUR"), Some(dec("35")));
        assert_eq!(parse_amount("-3,5"), Some(dec("-3.5")));
        assert_eq!(parse_amount("gratis"), None);
        assert_eq!(parse_amount("  "), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let march_5 = parse_date("2024-03-05").unwrap();
        assert_eq!(parse_date("05/03/2024"), Some(march_5));
        assert_eq!(parse_date("05-03-2024"), Some(march_5));
        assert_eq!(parse_date("05.03.2024"), Some(march_5));
        assert_eq!(parse_date("05/03/24"), Some(march_5));
        assert_eq!(parse_date("2024-03-05T10:30:00"), Some(march_5));
        assert_eq!(parse_date("05/03/2024 18:00"), Some(march_5));
        assert_eq!(parse_date("31/02/2024"), None);
        assert_eq!(parse_date("ayer"), None);
    }

    #[test]
    fn test_channel_and_status_mapping() {
        assert_eq!(parse_channel("Mercadillo de Navidad"), SalesChannel::Market);
        assert_eq!(parse_channel("Instagram DM"), SalesChannel::Instagram);
        assert_eq!(parse_channel("IG"), SalesChannel::Instagram);
        assert_eq!(parse_channel("Amigos"), SalesChannel::Other);
        assert_eq!(parse_channel("Tienda online"), SalesChannel::Web);
        assert_eq!(parse_channel("Venta al por mayor"), SalesChannel::Wholesale);
        assert_eq!(parse_channel(""), SalesChannel::Other);

        assert_eq!(parse_status("Pagado"), Some(OrderStatus::Paid));
        assert_eq!(parse_status("ENVIADO"), Some(OrderStatus::Shipped));
        assert_eq!(parse_status("anulado"), Some(OrderStatus::Cancelled));
        assert_eq!(parse_status("?"), None);
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("Fecha;Cliente;Total\n01/02/2024;Ana;12,50"), b';');
        assert_eq!(sniff_delimiter("date,customer,total\n"), b',');
        assert_eq!(sniff_delimiter("\n\nfecha\tcliente\ttotal"), b'\t');
        assert_eq!(sniff_delimiter("\"a;b\",c,d"), b',');
    }

    #[test]
    fn test_spanish_export() {
        let csv = "\u{feff}Fecha;Cliente;Canal;Producto;Cantidad;Importe;Estado\n\
                   05/03/2024;Lucía Pérez;Mercadillo;Cojín bordado;2;49,00 €;Pagado\n\
                   06/03/2024;;Instagram;Bolso rafia;1;35;\n\
                   ;Sin fecha;Web;Cesta;1;20;\n\
                   07/03/2024;Marta;Web;Cesta;1;;\n\
                   ;;;;;;\n";
        let outcome = parse_orders_csv(csv).unwrap();

        assert_eq!(outcome.orders.len(), 2);
        let first = &outcome.orders[0].order;
        assert_eq!(first.customer_name, "Lucía Pérez");
        assert_eq!(first.channel, Some(SalesChannel::Market));
        assert_eq!(first.status, Some(OrderStatus::Paid));
        assert_eq!(first.total, Some(dec("49.00")));
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].quantity, 2);
        assert_eq!(first.items[0].unit_price, dec("24.50"));
        assert!(first.order_number.as_deref().unwrap().starts_with("IMP-20240305-"));

        let second = &outcome.orders[1].order;
        assert_eq!(second.customer_name, UNKNOWN_CUSTOMER);
        assert_eq!(second.status, Some(DEFAULT_IMPORT_STATUS));

        assert_eq!(
            outcome.skipped,
            vec![
                SkippedRow { line: 4, reason: "missing date".into() },
                SkippedRow { line: 5, reason: "missing total".into() },
            ]
        );
    }

    #[test]
    fn test_rows_with_same_number_are_grouped() {
        let csv = "Order Number,Date,Customer,Item,Qty,Amount\n\
                   A-1,2024-05-01,Ana,Cushion,1,20.00\n\
                   A-2,2024-05-01,Bea,Basket,1,15.00\n\
                   A-1,2024-05-01,Ana,Throw,2,\"1,050.00\"\n";
        let outcome = parse_orders_csv(csv).unwrap();
        assert_eq!(outcome.orders.len(), 2);
        let a1 = &outcome.orders[0].order;
        assert_eq!(a1.order_number.as_deref(), Some("A-1"));
        assert_eq!(a1.items.len(), 2);
        assert_eq!(a1.total, Some(dec("1070.00")));
        assert_eq!(a1.effective_total(), dec("1070.00"));
    }

    #[test]
    fn test_derived_numbers_are_stable() {
        let csv = "fecha,total\n01/01/2024,10\n";
        let a = parse_orders_csv(csv).unwrap();
        let b = parse_orders_csv(csv).unwrap();
        assert_eq!(a.orders[0].order.order_number, b.orders[0].order.order_number);
    }

    #[test]
    fn test_identical_rows_stay_separate_orders() {
        let csv = "Fecha;Cliente;Producto;Importe\n\
                   05/03/2024;Ana;Cesta;20\n\
                   05/03/2024;Ana;Cesta;20\n";
        let outcome = parse_orders_csv(csv).unwrap();
        assert_eq!(outcome.orders.len(), 2);
        assert_ne!(outcome.orders[0].order.order_number, outcome.orders[1].order.order_number);
        assert_eq!(outcome.orders[0].line, 2);
        assert_eq!(outcome.orders[1].line, 3);
        for parsed in &outcome.orders {
            assert_eq!(parsed.order.total, Some(dec("20")));
            assert_eq!(parsed.order.items.len(), 1);
        }

        let again = parse_orders_csv(csv).unwrap();
        assert_eq!(again.orders[1].order.order_number, outcome.orders[1].order.order_number);
    }

    #[test]
    fn test_amounts_too_large_to_store_are_skipped() {
        let csv = "Fecha;Importe\n\
                   06/03/2024;123.456.789.012,00\n\
                   07/03/2024;15,00\n";
        let outcome = parse_orders_csv(csv).unwrap();
        assert_eq!(outcome.orders.len(), 1);
        assert_eq!(outcome.orders[0].order.total, Some(dec("15.00")));
        assert_eq!(
            outcome.skipped,
            vec![SkippedRow {
                line: 2,
                reason: "amount out of range '123.456.789.012,00'".into(),
            }]
        );
    }

    #[test]
    fn test_grouped_total_overflow_skips_the_row() {
        let csv = "pedido,fecha,total\n\
                   A-1,2024-01-02,9000000000\n\
                   A-1,2024-01-02,9000000000\n";
        let outcome = parse_orders_csv(csv).unwrap();
        assert_eq!(outcome.orders.len(), 1);
        assert_eq!(outcome.orders[0].order.total, Some(dec("9000000000")));
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].line, 3);
    }

    #[test]
    fn test_missing_required_columns() {
        let err = parse_orders_csv("cliente;importe\nAna;10").unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("date")));
        assert!(matches!(parse_orders_csv("  \n"), Err(ImportError::Empty)));

        let app: AppError = ImportError::MissingColumn("total").into();
        assert_eq!(app.code, ErrorCode::OrderImportFailed);
    }

    #[test]
    fn test_loose_header_match() {
        let csv = "Fecha del pedido;Total (€)\n02/02/2024;5\n";
        let outcome = parse_orders_csv(csv).unwrap();
        assert_eq!(outcome.orders.len(), 1);
    }
}
