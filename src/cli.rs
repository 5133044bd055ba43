// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn currency_opt() -> Arg {
    Arg::new("currency")
        .long("currency")
        .short('c')
        .help("Target currency (defaults to the configured one)")
}

fn month_opt() -> Arg {
    Arg::new("month").long("month").help("Month as YYYY-MM")
}

fn limit_opt() -> Arg {
    Arg::new("limit")
        .long("limit")
        .value_parser(value_parser!(usize))
}

fn id_arg() -> Arg {
    Arg::new("id").required(true).value_parser(value_parser!(i64))
}

fn tx_fields(cmd: Command) -> Command {
    cmd.arg(Arg::new("title").long("title"))
        .arg(Arg::new("currency").long("currency").help("Currency code, default USD"))
        .arg(Arg::new("category").long("category"))
        .arg(
            Arg::new("date")
                .long("date")
                .help("YYYY-MM-DD or YYYY-MM-DD HH:MM, default now"),
        )
}

pub fn build_cli() -> Command {
    Command::new("fintrack")
        .about("Track income and expenses across currencies")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("SQLite database path (default: platform data dir)"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .global(true)
                .default_value("local")
                .help("Owner of the records"),
        )
        .arg(
            Arg::new("guest")
                .long("guest")
                .global(true)
                .help("Keep transactions in this JSON file instead of the database"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("tx")
                .about("Record and browse transactions")
                .subcommand(tx_fields(
                    Command::new("add")
                        .arg(
                            Arg::new("type")
                                .required(true)
                                .help("income or expense"),
                        )
                        .arg(
                            Arg::new("amount")
                                .required(true)
                                .allow_negative_numbers(true),
                        ),
                ))
                .subcommand(tx_fields(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("type").long("type")),
                ))
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(
                    Command::new("reset")
                        .about("Delete all of your transactions")
                        .arg(Arg::new("yes").long("yes").action(ArgAction::SetTrue)),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(month_opt())
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .help("All, Income, or a category name"),
                        )
                        .arg(Arg::new("from").long("from").help("YYYY-MM-DD"))
                        .arg(Arg::new("to").long("to").help("YYYY-MM-DD"))
                        .arg(Arg::new("min").long("min"))
                        .arg(Arg::new("max").long("max"))
                        .arg(limit_opt()),
                )),
        )
        .subcommand(
            Command::new("category")
                .about("Manage custom categories")
                .subcommand(Command::new("add").arg(Arg::new("name").required(true)))
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rename")
                        .arg(id_arg())
                        .arg(Arg::new("name").required(true)),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("fx")
                .about("Exchange rates")
                .subcommand(Command::new("fetch").about("Refresh rates from NBP"))
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("convert")
                        .arg(Arg::new("amount").required(true))
                        .arg(Arg::new("from").required(true))
                        .arg(Arg::new("to")),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Totals in one currency")
                .subcommand(json_flags(Command::new("summary").arg(currency_opt())))
                .subcommand(json_flags(
                    Command::new("month").arg(currency_opt()).arg(month_opt()),
                ))
                .subcommand(json_flags(Command::new("by-category").arg(currency_opt())))
                .subcommand(json_flags(
                    Command::new("recent").arg(currency_opt()).arg(limit_opt()),
                ))
                .subcommand(json_flags(
                    Command::new("dashboard")
                        .arg(currency_opt())
                        .arg(month_opt())
                        .arg(limit_opt()),
                )),
        )
        .subcommand(
            Command::new("budget")
                .about("Annual spending budget")
                .subcommand(
                    Command::new("set").arg(
                        Arg::new("amount")
                            .required(true)
                            .allow_negative_numbers(true),
                    ),
                )
                .subcommand(json_flags(
                    Command::new("status")
                        .arg(Arg::new("year").long("year").value_parser(value_parser!(i32))),
                )),
        )
        .subcommand(
            Command::new("settings")
                .subcommand(Command::new("show"))
                .subcommand(Command::new("currency").arg(Arg::new("currency").required(true)))
                .subcommand(
                    Command::new("max-age").arg(
                        Arg::new("hours")
                            .required(true)
                            .value_parser(value_parser!(u32)),
                    ),
                ),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("transactions")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv or json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(Command::new("doctor").about("Check data quality"))
}
