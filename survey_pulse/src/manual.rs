/*!

This is the long-form manual for `survey_pulse` and `pulsedash`.

## Input formats

All the exports are comma separated text, with `"` as the quoting character
and `""` for a literal quote inside a quoted field. The first line is always
a header and is never interpreted. Blank lines are ignored.

Spreadsheets (`.xlsx`) are accepted by `pulsedash`, which turns the selected
worksheet into the same text before parsing.

The following kinds are supported:
* `cycle` (or `nps`): one satisfaction score cycle
* `meeting`: meeting evaluations
* `implementation` (or `onboarding`): implementation evaluations

### `cycle`

At least 20 fields per row. Every row repeats the cycle-level figures next to
one individual response:

| Columns | Content |
|---------|---------|
| 0 - 10  | cycle id, title, score, zone, invited, responded, detractors, neutrals, promoters, start date, end date |
| 12 - 19 | respondent id, respondent name, score, status, justification, response date, unit id, unit name |
| 21, 23  | unit CNPJ, unit zone |

The cycle-level figures are read from the first data row only. Dates are
written `DD/MM/YYYY`, optionally followed by a `HH:MM[:SS]` time. A response
is kept when it names a respondent or a unit.

The score of a cycle uses a comma or a period as decimal separator:

```text
ID,Título,NPS,...
C1,Ciclo 1,"45,5",...
```

### `meeting`

At least 10 fields per row: timestamp, consultant, satisfaction (1 to 5),
six criteria answered on the agreement scale, comment. The agreement scale
is mapped as follows:

| Answer | Value |
|--------|-------|
| Concordo totalmente | 5 |
| Concordo | 4 |
| Neutro | 3 |
| Discordo | 2 |
| Discordo totalmente | 1 |
| anything else | 0 |

### `implementation`

At least 25 fields per row. After the timestamp, name, unit and general
satisfaction (columns 0 to 3), each of the eight steps (training, team,
architect, machines, VendPago, SULTS, Stone, technician) takes a
satisfaction, an ease answer and a comment. Training, machines and
technician are preceded by the name of the responsible party.

A satisfaction of 0 means the question was not answered: it is left out of
every mean.

## Skipped rows

A row that cannot be used never fails a parse. It is listed in the
[`ParseReport`](crate::ParseReport) of the result and logged at the `warn`
or `debug` level.

## Configuration

`pulsedash` takes either a single input (`--input` and `--input-type`) or a
configuration file in JSON:

```json
{
  "outputSettings": {
    "dashboardName": "Pesquisa 2024",
    "outputPath": "summary.json"
  },
  "sources": [
    { "kind": "cycle", "filePath": "ciclo_jan.xlsx", "excelWorksheetName": "Respostas" },
    { "kind": "cycle", "filePath": "ciclo_fev.csv", "hidden": true },
    { "kind": "meeting", "filePath": "reunioes.csv" }
  ],
  "comparison": {
    "filter": "recovered_detractor",
    "search": ""
  }
}
```

Relative file paths are resolved against the directory of the
configuration file. Hidden cycles are loaded but left out of the trend and
of the migrations.

The `filter` of the comparison is one of `all`, `improved`, `stable`,
`declined`, `recovered_detractor`, `lost_promoter`, `retained_neutral`.

 */
