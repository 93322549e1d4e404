use std::fs;
use std::io::Error;
use std::path::Path;

pub const STORES: &str = "\
id,name,address,contact_email
123,Sample Store,123 Sample St,owner@sample.test
124,No Contact Cafe,9 Quiet Lane,
";

pub const CUSTOMERS: &str = "\
user_id,name
5001,Zhang San
5002,Li Si
";

// 1004 is cash, 1005 falls in the next period, 1006 belongs to store 124.
pub const ORDERS: &str = "\
id,store_id,user_id,created_at,pickup_code,store_total_fee,tip_fee,refund_amount,payment_method,channel,state
1001,123,5001,2023-01-01T11:00:00,A123,120.50,5.00,0.00,7,2,5000
1002,123,5002,2023-01-02T12:00:00,B456,85.75,0.00,10.00,5,1,5000
1003,123,5001,2023-01-07T21:30:00,C789,40.00,0.00,0.00,6,2,5000
1004,123,5003,2023-01-03T10:00:00,D000,15.00,0.00,0.00,1,2,5000
1005,123,5003,2023-01-08T10:00:00,E000,15.00,0.00,0.00,7,2,5000
1006,124,5002,2023-01-03T10:00:00,F111,30.00,0.00,0.00,7,2,5000
";

pub const DISHES: &str = "\
order_id,dish_id,amount
1001,1,100.00
1002,2,50.00
1003,3,20.00
1003,4,10.00
";

// GST on 100.00, liquor on 50.00, soda on 20.00, unknown category on 10.00.
pub const DISH_TAXES: &str = "\
order_id,dish_id,system_tax_id
1001,1,1
1002,2,2
1003,3,3
1003,4,9
";

pub const BILLS: &str = r#"[
  {
    "id": 1,
    "store_id": 123,
    "start_date": "2023-01-01",
    "end_date": "2023-01-07",
    "store_amount": 1000.00,
    "original_price": 1200.00,
    "discount_fee": 50.00,
    "refund_amount": 150.00,
    "product_tax_fee": 80.00,
    "commission_fee": 60.00,
    "refund_commission_fee": 10.00,
    "asset_balance_repayment": 20.00,
    "extra_fee": 5.00,
    "stripe_fee": 30.00,
    "pickup_tip_fee": 0.00,
    "remark": "Special promotion",
    "settlement_amount": 1000.00
  },
  {
    "id": 2,
    "store_id": 124,
    "start_date": "2023-01-01",
    "end_date": "2023-01-07",
    "original_price": "30.00",
    "product_tax_fee": "1.50",
    "stripe_fee": "1.25",
    "settlement_amount": "25.50"
  },
  {
    "id": 3,
    "store_id": 125,
    "start_date": "2023-01-01",
    "end_date": "2023-01-07",
    "settlement_amount": 10
  },
  {
    "id": 4,
    "store_id": 123,
    "start_date": "2023-01-08",
    "end_date": "2023-01-14",
    "settlement_amount": 0
  }
]"#;

/// Writes the sample dataset into `dir`.
pub fn write_dataset(dir: &Path) -> Result<(), Error> {
    fs::write(dir.join("stores.csv"), STORES)?;
    fs::write(dir.join("customers.csv"), CUSTOMERS)?;
    fs::write(dir.join("orders.csv"), ORDERS)?;
    fs::write(dir.join("order_dishes.csv"), DISHES)?;
    fs::write(dir.join("order_dish_taxes.csv"), DISH_TAXES)?;
    fs::write(dir.join("bills.json"), BILLS)?;
    Ok(())
}
