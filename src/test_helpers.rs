use crate::PostgresConnection;
use uuid::Uuid;

/// A helper for running tests that require a live database.
///
/// This will automatically create a new database for each test,
/// and drop it when the test is done, if the test succeeded.
///
/// All the methods on this struct unwraps errors directly to make it easier
/// to write tests.
pub struct TestHelper {
    /// The name of the test database
    pub test_db_name: String,
    /// The main connection used against the database
    main_connection: PostgresConnection,
    /// An identifier for the test helper
    helper_name: String,
    /// The port of the Postgres instance that was connected to.
    pub port: u16,
    /// If the database was cleaned up nicely
    cleaned_up_nicely: bool,
}

impl Drop for TestHelper {
    /// Drops the test helper, cleaning up the database if the test succeeded.
    fn drop(&mut self) {
        if self.cleaned_up_nicely {
            return;
        }

        if std::thread::panicking() {
            eprintln!("Thread is panicking when dropping test helper. Leaving database '{}' ({}) around to be inspected", self.test_db_name, self.helper_name);
        } else {
            let db_name = self.test_db_name.clone();
            let port = self.port;
            std::thread::spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();
                runtime.block_on(cleanup(&db_name, port));
            })
            .join()
            .expect("Failed to run test helper cleanup from drop");
        }
    }
}

/// Creates a new test helper, using a random database name.
/// This will connect to Postgres 15 on port 5415.
pub async fn get_test_helper(name: &str) -> TestHelper {
    get_test_helper_on_port(name, 5415).await
}

/// Creates a new test helper, using a random database name and a specific port.
pub async fn get_test_helper_on_port(name: &str, port: u16) -> TestHelper {
    let id = Uuid::new_v4().simple().to_string();

    let test_db_name = format!("test_db_{}", id);
    {
        let conn = get_test_connection_on_port("postgres", port).await;

        conn.execute_non_query(&format!("create database {}", test_db_name))
            .await
            .expect("Failed to create test database");
    }

    let conn = get_test_connection_on_port(&test_db_name, port).await;

    TestHelper {
        test_db_name,
        main_connection: conn,
        helper_name: name.to_string(),
        port,
        cleaned_up_nicely: false,
    }
}

impl TestHelper {
    /// Executes a query that does not return any results.
    pub async fn execute_not_query(&self, sql: &str) {
        self.get_conn()
            .execute_non_query(sql)
            .await
            .unwrap_or_else(|e| panic!("Failed to execute non query: {:?}\n{}", e, sql));
    }

    /// Gets the underlying connection to the database.
    pub fn get_conn(&self) -> &PostgresConnection {
        &self.main_connection
    }

    /// Gets a mutable connection, needed to open transactions.
    pub fn get_conn_mut(&mut self) -> &mut PostgresConnection {
        &mut self.main_connection
    }

    /// Stops the test helper, cleaning up the database.
    pub async fn stop(mut self) {
        cleanup(&self.test_db_name, self.port).await;
        self.cleaned_up_nicely = true;
    }
}

/// Gets a connection to the specified database on the specified port.
async fn get_test_connection_on_port(database_name: &str, port: u16) -> PostgresConnection {
    let connection_string = format!(
        "host=localhost port={port} user=postgres password=passw0rd dbname={database_name}"
    );

    PostgresConnection::connect(&connection_string)
        .await
        .expect("Connection to test database failed. Is postgres running?")
}

async fn cleanup(db_name: &str, port: u16) {
    let conn = get_test_connection_on_port("postgres", port).await;
    conn.execute_non_query(&format!("drop database {} with (force);", db_name))
        .await
        .expect("Failed to drop test database");
}
