use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_production_tables::Migration),
            Box::new(m20240101_000003_create_workforce_tables::Migration),
            Box::new(m20240101_000004_create_procurement_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Vendor::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Vendor::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Vendor::Name).string().null())
                        .col(ColumnDef::new(Vendor::Company).string().null())
                        .col(ColumnDef::new(Vendor::PaymentPeriod).string().null())
                        .col(ColumnDef::new(Vendor::Contact).string().null())
                        .col(ColumnDef::new(Vendor::Address).string().null())
                        .col(ColumnDef::new(Vendor::Email).string().null())
                        .col(ColumnDef::new(Vendor::Fax).string().null())
                        .col(ColumnDef::new(Vendor::Notice).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Component::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Component::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Component::Name).string().not_null())
                        .col(ColumnDef::new(Component::Category).string().null())
                        .col(ColumnDef::new(Component::Model).string().null())
                        .col(ColumnDef::new(Component::Description).string().null())
                        .col(ColumnDef::new(Component::AsUnit).string().null())
                        .col(ColumnDef::new(Component::UnitWeight).double().null())
                        .col(ColumnDef::new(Component::WarnStock).integer().null())
                        .col(ColumnDef::new(Component::Notice).string().null())
                        .col(
                            ColumnDef::new(Component::Hide)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Specification::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Specification::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Specification::ComponentId)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Specification::VendorId).integer().not_null())
                        .col(
                            ColumnDef::new(Specification::GrossPrice)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Specification::NetPrice)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Specification::UseNet)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Specification::Stock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Specification::UnitAmount).integer().null())
                        .col(ColumnDef::new(Specification::Notice).string().null())
                        .col(
                            ColumnDef::new(Specification::Hide)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_specification_component_id")
                        .table(Specification::Table)
                        .col(Specification::ComponentId)
                        .to_owned(),
                )
                .await?;

            // One specification per component/vendor pair; the service-level
            // guard relies on this as its concurrent backstop.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_specification_component_vendor")
                        .table(Specification::Table)
                        .col(Specification::ComponentId)
                        .col(Specification::VendorId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Product::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Product::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Product::Name).string().null())
                        .col(ColumnDef::new(Product::Category).string().null())
                        .col(ColumnDef::new(Product::Description).string().null())
                        .col(
                            ColumnDef::new(Product::Inventory)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Product::Notice).string().null())
                        .col(
                            ColumnDef::new(Product::Deprecated)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Product::DeprecatedDate).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Process::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Process::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Process::ProductId).string().not_null())
                        .col(ColumnDef::new(Process::ProcessName).string().not_null())
                        .col(ColumnDef::new(Process::ProcessOrder).integer().not_null())
                        .col(
                            ColumnDef::new(Process::UnitPay)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Process::Notice).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_process_product_id")
                        .table(Process::Table)
                        .col(Process::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Process::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Product::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Specification::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Component::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Vendor::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Vendor {
        Table,
        Id,
        Name,
        Company,
        PaymentPeriod,
        Contact,
        Address,
        Email,
        Fax,
        Notice,
    }

    #[derive(DeriveIden)]
    enum Component {
        Table,
        Id,
        Name,
        Category,
        Model,
        Description,
        AsUnit,
        UnitWeight,
        WarnStock,
        Notice,
        Hide,
    }

    #[derive(DeriveIden)]
    enum Specification {
        Table,
        Id,
        ComponentId,
        VendorId,
        GrossPrice,
        NetPrice,
        UseNet,
        Stock,
        UnitAmount,
        Notice,
        Hide,
    }

    #[derive(DeriveIden)]
    enum Product {
        Table,
        Id,
        Name,
        Category,
        Description,
        Inventory,
        Notice,
        Deprecated,
        DeprecatedDate,
    }

    #[derive(DeriveIden)]
    enum Process {
        Table,
        Id,
        ProductId,
        ProcessName,
        ProcessOrder,
        UnitPay,
        Notice,
    }
}

mod m20240101_000002_create_production_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_production_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Batch ids come from the month-window allocator, never from the
            // database sequence.
            manager
                .create_table(
                    Table::create()
                        .table(Batch::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Batch::Id)
                                .integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Batch::Status).string().not_null())
                        .col(ColumnDef::new(Batch::ProductId).string().not_null())
                        .col(ColumnDef::new(Batch::PlanAmount).integer().not_null())
                        .col(ColumnDef::new(Batch::ActualAmount).integer().null())
                        .col(ColumnDef::new(Batch::Create).timestamp().not_null())
                        .col(ColumnDef::new(Batch::Start).timestamp().not_null())
                        .col(ColumnDef::new(Batch::End).timestamp().null())
                        .col(ColumnDef::new(Batch::Ship).timestamp().null())
                        .col(ColumnDef::new(Batch::Notice).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_batch_status")
                        .table(Batch::Table)
                        .col(Batch::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_batch_product_id")
                        .table(Batch::Table)
                        .col(Batch::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_batch_start")
                        .table(Batch::Table)
                        .col(Batch::Start)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BatchProcess::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BatchProcess::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(BatchProcess::Status).string().not_null())
                        .col(ColumnDef::new(BatchProcess::BatchId).integer().not_null())
                        .col(ColumnDef::new(BatchProcess::ProcessId).string().not_null())
                        .col(ColumnDef::new(BatchProcess::StartAmount).integer().null())
                        .col(ColumnDef::new(BatchProcess::EndAmount).integer().null())
                        .col(
                            ColumnDef::new(BatchProcess::UnitPay)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_batch_process_batch_id")
                        .table(BatchProcess::Table)
                        .col(BatchProcess::BatchId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_batch_process_process_id")
                        .table(BatchProcess::Table)
                        .col(BatchProcess::ProcessId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WarehouseRecord::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WarehouseRecord::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(WarehouseRecord::BatchProcessId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseRecord::ComponentId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseRecord::SpecificationId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseRecord::ComponentName)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseRecord::Consumption)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseRecord::SpecificationNetPrice)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WarehouseRecord::SpecificationGrossPrice)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_warehouse_record_batch_process_id")
                        .table(WarehouseRecord::Table)
                        .col(WarehouseRecord::BatchProcessId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_warehouse_record_component_id")
                        .table(WarehouseRecord::Table)
                        .col(WarehouseRecord::ComponentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WarehouseRecord::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(BatchProcess::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Batch::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Batch {
        Table,
        Id,
        Status,
        ProductId,
        PlanAmount,
        ActualAmount,
        Create,
        Start,
        End,
        Ship,
        Notice,
    }

    #[derive(DeriveIden)]
    enum BatchProcess {
        Table,
        Id,
        Status,
        BatchId,
        ProcessId,
        StartAmount,
        EndAmount,
        UnitPay,
    }

    #[derive(DeriveIden)]
    enum WarehouseRecord {
        Table,
        Id,
        BatchProcessId,
        ComponentId,
        SpecificationId,
        ComponentName,
        Consumption,
        SpecificationNetPrice,
        SpecificationGrossPrice,
    }
}

mod m20240101_000003_create_workforce_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_workforce_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Employee::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Employee::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Employee::Name).string().not_null())
                        .col(ColumnDef::new(Employee::Gender).string().null())
                        .col(ColumnDef::new(Employee::Phone).string().null())
                        .col(ColumnDef::new(Employee::Department).string().null())
                        .col(ColumnDef::new(Employee::Status).string().null())
                        .col(ColumnDef::new(Employee::Onboard).timestamp().null())
                        .col(ColumnDef::new(Employee::Notice).string().null())
                        .col(ColumnDef::new(Employee::LastPayCheck).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Salary::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Salary::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Salary::EmployeeId).integer().not_null())
                        .col(ColumnDef::new(Salary::EmployeeName).string().null())
                        .col(ColumnDef::new(Salary::StartDate).date().not_null())
                        .col(ColumnDef::new(Salary::EndDate).date().not_null())
                        .col(ColumnDef::new(Salary::UnitSalary).double().null())
                        .col(ColumnDef::new(Salary::HourSalary).double().null())
                        .col(
                            ColumnDef::new(Salary::Deduction)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Salary::Bonus).double().not_null().default(0))
                        .col(ColumnDef::new(Salary::Status).string().null())
                        .col(ColumnDef::new(Salary::Notice).string().null())
                        .col(ColumnDef::new(Salary::CheckDate).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_salary_employee_id")
                        .table(Salary::Table)
                        .col(Salary::EmployeeId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_salary_status")
                        .table(Salary::Table)
                        .col(Salary::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Work::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Work::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Work::BatchProcessId).integer().not_null())
                        .col(ColumnDef::new(Work::EmployeeId).integer().null())
                        .col(ColumnDef::new(Work::EmployeeName).string().null())
                        .col(ColumnDef::new(Work::WorkDate).date().not_null())
                        .col(ColumnDef::new(Work::UnitPay).double().not_null().default(0))
                        .col(
                            ColumnDef::new(Work::CompleteUnit)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Work::HourPay).double().not_null().default(0))
                        .col(
                            ColumnDef::new(Work::CompleteHour)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Work::PlanUnit)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Work::Check)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Work::SalaryId).integer().null())
                        .col(ColumnDef::new(Work::ProductName).string().null())
                        .col(ColumnDef::new(Work::ProcessName).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_batch_process_id")
                        .table(Work::Table)
                        .col(Work::BatchProcessId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_employee_id")
                        .table(Work::Table)
                        .col(Work::EmployeeId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_work_date")
                        .table(Work::Table)
                        .col(Work::WorkDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_salary_id")
                        .table(Work::Table)
                        .col(Work::SalaryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkSpecification::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkSpecification::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(WorkSpecification::WorkId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkSpecification::SpecificationId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkSpecification::ComponentName)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkSpecification::PlanAmount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WorkSpecification::ActualAmount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WorkSpecification::SpecificationNetPrice)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WorkSpecification::SpecificationGrossPrice)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_specification_work_id")
                        .table(WorkSpecification::Table)
                        .col(WorkSpecification::WorkId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WorkSpecification::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Work::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Salary::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Employee::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Employee {
        Table,
        Id,
        Name,
        Gender,
        Phone,
        Department,
        Status,
        Onboard,
        Notice,
        LastPayCheck,
    }

    #[derive(DeriveIden)]
    enum Salary {
        Table,
        Id,
        EmployeeId,
        EmployeeName,
        StartDate,
        EndDate,
        UnitSalary,
        HourSalary,
        Deduction,
        Bonus,
        Status,
        Notice,
        CheckDate,
    }

    #[derive(DeriveIden)]
    enum Work {
        Table,
        Id,
        BatchProcessId,
        EmployeeId,
        EmployeeName,
        WorkDate,
        UnitPay,
        CompleteUnit,
        HourPay,
        CompleteHour,
        PlanUnit,
        Check,
        SalaryId,
        ProductName,
        ProcessName,
    }

    #[derive(DeriveIden)]
    enum WorkSpecification {
        Table,
        Id,
        WorkId,
        SpecificationId,
        ComponentName,
        PlanAmount,
        ActualAmount,
        SpecificationNetPrice,
        SpecificationGrossPrice,
    }
}

mod m20240101_000004_create_procurement_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_procurement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InstockForm::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InstockForm::FormId)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InstockForm::DisplayFormId)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InstockForm::VendorId).integer().not_null())
                        .col(
                            ColumnDef::new(InstockForm::CreateTime)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InstockForm::FormStatus).string().not_null())
                        .col(
                            ColumnDef::new(InstockForm::Amount)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InstockForm::Note).string().null())
                        .col(
                            ColumnDef::new(InstockForm::Paid)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            // Backstop for the display-id allocator: concurrent allocations of
            // the same id must fail at insert, not silently coexist.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_instock_form_display_form_id")
                        .table(InstockForm::Table)
                        .col(InstockForm::DisplayFormId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_instock_form_vendor_id")
                        .table(InstockForm::Table)
                        .col(InstockForm::VendorId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_instock_form_form_status")
                        .table(InstockForm::Table)
                        .col(InstockForm::FormStatus)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InstockItem::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InstockItem::InstockItemId)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(InstockItem::FormId).integer().not_null())
                        .col(
                            ColumnDef::new(InstockItem::SpecificationId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InstockItem::OrderQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InstockItem::UnitCost)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InstockItem::WarehouseQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InstockItem::LastTime).timestamp().null())
                        .col(ColumnDef::new(InstockItem::InstockDate).date().null())
                        .col(
                            ColumnDef::new(InstockItem::VendorInstockDate)
                                .date()
                                .null(),
                        )
                        .col(ColumnDef::new(InstockItem::Notice).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_instock_item_form_id")
                        .table(InstockItem::Table)
                        .col(InstockItem::FormId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_instock_item_specification_id")
                        .table(InstockItem::Table)
                        .col(InstockItem::SpecificationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InstockRecord::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InstockRecord::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InstockRecord::InstockItemId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InstockRecord::AmountIn).integer().not_null())
                        .col(ColumnDef::new(InstockRecord::Balance).integer().not_null())
                        .col(ColumnDef::new(InstockRecord::Operator).string().null())
                        .col(
                            ColumnDef::new(InstockRecord::RecordTime)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InstockRecord::Note).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_instock_record_instock_item_id")
                        .table(InstockRecord::Table)
                        .col(InstockRecord::InstockItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_instock_record_record_time")
                        .table(InstockRecord::Table)
                        .col(InstockRecord::RecordTime)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InstockRecord::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InstockItem::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InstockForm::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InstockForm {
        Table,
        FormId,
        DisplayFormId,
        VendorId,
        CreateTime,
        FormStatus,
        Amount,
        Note,
        Paid,
    }

    #[derive(DeriveIden)]
    enum InstockItem {
        Table,
        InstockItemId,
        FormId,
        SpecificationId,
        OrderQuantity,
        UnitCost,
        WarehouseQuantity,
        LastTime,
        InstockDate,
        VendorInstockDate,
        Notice,
    }

    #[derive(DeriveIden)]
    enum InstockRecord {
        Table,
        Id,
        InstockItemId,
        AmountIn,
        Balance,
        Operator,
        RecordTime,
        Note,
    }
}
