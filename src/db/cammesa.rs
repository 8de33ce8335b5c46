pub mod erenovables_archive;
