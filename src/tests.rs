mod pool_props_test;
mod update_record_test;
