//! Utility to set the owner profile in the database
//!
//! Usage: set_profile <name> [date_of_birth YYYY-MM-DD] [male|female]

use std::path::PathBuf;

fn get_database_path() -> PathBuf {
    std::env::var("WELLMETRICS_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            std::fs::create_dir_all(&path).ok();
            path.push("wellmetrics.db");
            path
        })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let name = match args.first() {
        Some(n) => n.clone(),
        None => {
            eprintln!("Usage: set_profile <name> [date_of_birth YYYY-MM-DD] [male|female]");
            std::process::exit(1);
        }
    };
    let date_of_birth = args.get(1).cloned();
    let gender = match args.get(2) {
        Some(g) => match wellmetrics::models::Gender::from_str(g) {
            Some(parsed) => Some(parsed),
            None => {
                eprintln!("Invalid gender: '{}'. Valid values: male, female", g);
                std::process::exit(1);
            }
        },
        None => None,
    };

    let db_path = get_database_path();
    println!("Database path: {}", db_path.display());

    let database = wellmetrics::db::Database::new(&db_path)?;

    // Run migrations
    database.with_conn(|conn| {
        wellmetrics::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    // Set the profile
    database.with_conn(|conn| {
        let profile =
            wellmetrics::models::Profile::set(conn, &name, date_of_birth.as_deref(), gender)?;
        println!("Profile set:");
        println!("  Name: {}", profile.name);
        if let Some(dob) = &profile.date_of_birth {
            println!("  DOB: {}", dob);
        }
        if let Some(g) = profile.gender {
            println!("  Gender: {}", g.as_str());
        }
        println!("  Updated: {}", profile.updated_at);
        Ok(())
    })?;

    Ok(())
}
